//! Bulk import of compendium data from CSV exports.
//!
//! Rows are matched on their natural key (name): a row whose name already
//! exists in the database is skipped, never overwritten, so re-running the
//! loader on the same dataset is safe.

use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Deserialize;
use tracing::info;

use grimoire_db::Database;
use grimoire_db::models::{NewMonster, NewSpell};

#[derive(Parser)]
#[command(name = "grimoire-loader")]
#[command(about = "Bulk-load compendium data from CSV files")]
struct Cli {
    /// Database file; falls back to GRIMOIRE_DB_PATH, then grimoire.db
    #[arg(long, global = true)]
    db: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load the monster compendium from a CSV file
    Monsters {
        #[arg(long)]
        file: PathBuf,
    },
    /// Load the spell compendium from a CSV file
    Spells {
        #[arg(long)]
        file: PathBuf,
    },
}

#[derive(Debug, Deserialize)]
struct MonsterRecord {
    name: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    cr: String,
    #[serde(default, rename = "type")]
    kind: String,
    ac: Option<i32>,
    hp: Option<i32>,
}

#[derive(Debug, Deserialize)]
struct SpellRecord {
    name: String,
    /// Comma-separated list of class names.
    #[serde(default)]
    classes: String,
    level: Option<i32>,
    #[serde(default)]
    school: String,
    #[serde(default)]
    cast_time: String,
    #[serde(default)]
    range: String,
    #[serde(default)]
    duration: String,
    #[serde(default)]
    verbal: String,
    #[serde(default)]
    somatic: String,
    #[serde(default)]
    material: String,
    #[serde(default)]
    material_cost: String,
    #[serde(default)]
    description: String,
}

fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();

    let db_path = cli.db.unwrap_or_else(|| {
        PathBuf::from(std::env::var("GRIMOIRE_DB_PATH").unwrap_or_else(|_| "grimoire.db".into()))
    });
    let db = Database::open(&db_path)?;

    match cli.command {
        Commands::Monsters { file } => {
            let reader = open_csv(&file)?;
            import_monsters(&db, reader)
        }
        Commands::Spells { file } => {
            let reader = open_csv(&file)?;
            import_spells(&db, reader)
        }
    }
}

fn open_csv(file: &Path) -> anyhow::Result<csv::Reader<std::fs::File>> {
    csv::Reader::from_path(file).with_context(|| format!("cannot open {}", file.display()))
}

fn import_monsters<R: Read>(db: &Database, mut reader: csv::Reader<R>) -> anyhow::Result<()> {
    let mut inserted = 0usize;
    let mut skipped = 0usize;

    for record in reader.deserialize() {
        let record: MonsterRecord = record?;
        let monster = NewMonster {
            url: record.url,
            cr: record.cr,
            kind: record.kind,
            ac: record.ac.unwrap_or_default(),
            hp: record.hp.unwrap_or_default(),
            name: record.name,
        };

        if db.insert_monster_if_new(&monster)? {
            inserted += 1;
        } else {
            skipped += 1;
        }
    }

    info!(
        "Monsters loaded: {} inserted, {} already present",
        inserted, skipped
    );
    Ok(())
}

fn import_spells<R: Read>(db: &Database, mut reader: csv::Reader<R>) -> anyhow::Result<()> {
    let mut inserted = 0usize;
    let mut skipped = 0usize;

    for record in reader.deserialize() {
        let record: SpellRecord = record?;
        let classes = serde_json::to_string(&split_classes(&record.classes))?;
        let spell = NewSpell {
            slug: slugify(&record.name),
            classes,
            level: record.level.unwrap_or_default(),
            school: record.school,
            cast_time: record.cast_time,
            range: record.range,
            duration: record.duration,
            verbal: truthy(&record.verbal),
            somatic: truthy(&record.somatic),
            material: truthy(&record.material),
            material_cost: none_if_empty(record.material_cost),
            description: record.description,
            name: record.name,
        };

        if db.insert_spell_if_new(&spell)? {
            inserted += 1;
        } else {
            skipped += 1;
        }
    }

    info!(
        "Spells loaded: {} inserted, {} already present",
        inserted, skipped
    );
    Ok(())
}

/// "Bard, Wizard" -> ["Bard", "Wizard"]
fn split_classes(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .collect()
}

/// Datasets spell the truthy columns differently ("True", "true", "1");
/// anything unrecognized reads as false.
fn truthy(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "true" | "1" | "yes"
    )
}

fn none_if_empty(raw: String) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// URL-safe slug for spell detail lookups: lowercase, with runs of
/// non-alphanumeric characters collapsed to single hyphens.
fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;

    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(ch.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }

    slug
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn slugify_collapses_punctuation() {
        assert_eq!(slugify("Mage Hand"), "mage-hand");
        assert_eq!(slugify("Antipathy/Sympathy"), "antipathy-sympathy");
        assert_eq!(slugify("  Melf's Acid Arrow  "), "melf-s-acid-arrow");
    }

    #[test]
    fn truthy_accepts_dataset_variants() {
        assert!(truthy("True"));
        assert!(truthy("true"));
        assert!(truthy("1"));
        assert!(!truthy("False"));
        assert!(!truthy(""));
        assert!(!truthy("nope"));
    }

    #[test]
    fn split_classes_trims_and_drops_empties() {
        assert_eq!(
            split_classes("Bard, Wizard , Sorcerer"),
            vec!["Bard", "Wizard", "Sorcerer"]
        );
        assert_eq!(split_classes(""), Vec::<String>::new());
    }

    #[test]
    fn monster_import_is_upsert_by_name() {
        let db = Database::open_in_memory().unwrap();
        let csv_data = "\
name,url,cr,type,ac,hp
Goblin,https://example.com/goblin,1/4,humanoid,15,7
Ogre,https://example.com/ogre,2,giant,11,59
";

        import_monsters(&db, csv::Reader::from_reader(Cursor::new(csv_data))).unwrap();
        // Second pass over the same dataset inserts nothing new.
        import_monsters(&db, csv::Reader::from_reader(Cursor::new(csv_data))).unwrap();

        let monsters = db.list_monsters().unwrap();
        assert_eq!(monsters.len(), 2);
    }

    #[test]
    fn spell_import_derives_slug_and_classes() {
        let db = Database::open_in_memory().unwrap();
        let csv_data = "\
name,classes,level,school,cast_time,range,duration,verbal,somatic,material,material_cost,description
Mage Hand,\"Bard, Wizard\",0,Conjuration,1 action,30 feet,1 minute,True,True,False,,A spectral hand.
";

        import_spells(&db, csv::Reader::from_reader(Cursor::new(csv_data))).unwrap();

        let spell = db.get_spell_by_slug("mage-hand").unwrap();
        assert_eq!(spell.name, "Mage Hand");
        assert_eq!(spell.classes, r#"["Bard","Wizard"]"#);
        assert!(spell.verbal);
        assert!(!spell.material);
        assert_eq!(spell.material_cost, None);
    }
}

use rusqlite::{OptionalExtension, params};
use uuid::Uuid;

use crate::Database;
use crate::error::{Result, StoreError};
use crate::models::{MonsterRow, NewMonster, NewSpell, SpellRow};

impl Database {
    // -- Monsters --

    pub fn list_monsters(&self) -> Result<Vec<MonsterRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, name, url, cr, type, ac, hp, created_at
                 FROM monsters ORDER BY name",
            )?;

            let rows = stmt
                .query_map([], row_to_monster)?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }

    pub fn get_monster(&self, id: &str) -> Result<MonsterRow> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT id, name, url, cr, type, ac, hp, created_at
                 FROM monsters WHERE id = ?1",
                [id],
                row_to_monster,
            )
            .optional()?
            .ok_or(StoreError::NotFound)
        })
    }

    /// Upsert-by-name for the bulk loader: inserts the monster unless one
    /// with the same name already exists. Returns whether a row was inserted.
    pub fn insert_monster_if_new(&self, m: &NewMonster) -> Result<bool> {
        self.with_conn(|conn| {
            let inserted = conn.execute(
                "INSERT INTO monsters (id, name, url, cr, type, ac, hp)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                 ON CONFLICT(name) DO NOTHING",
                params![
                    Uuid::new_v4().to_string(),
                    m.name,
                    m.url,
                    m.cr,
                    m.kind,
                    m.ac,
                    m.hp,
                ],
            )?;
            Ok(inserted > 0)
        })
    }

    // -- Spells --

    pub fn list_spells(&self) -> Result<Vec<SpellRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "{SPELL_COLUMNS} ORDER BY level, name"
            ))?;

            let rows = stmt
                .query_map([], row_to_spell)?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }

    /// Spell detail is addressed by slug, not id.
    pub fn get_spell_by_slug(&self, slug: &str) -> Result<SpellRow> {
        self.with_conn(|conn| {
            conn.query_row(
                &format!("{SPELL_COLUMNS} WHERE slug = ?1"),
                [slug],
                row_to_spell,
            )
            .optional()?
            .ok_or(StoreError::NotFound)
        })
    }

    /// Upsert-by-name for the bulk loader. Returns whether a row was inserted.
    pub fn insert_spell_if_new(&self, s: &NewSpell) -> Result<bool> {
        self.with_conn(|conn| {
            let inserted = conn.execute(
                "INSERT INTO spells
                    (id, name, slug, classes, level, school, cast_time, range,
                     duration, verbal, somatic, material, material_cost, description)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
                 ON CONFLICT(name) DO NOTHING",
                params![
                    Uuid::new_v4().to_string(),
                    s.name,
                    s.slug,
                    s.classes,
                    s.level,
                    s.school,
                    s.cast_time,
                    s.range,
                    s.duration,
                    s.verbal,
                    s.somatic,
                    s.material,
                    s.material_cost,
                    s.description,
                ],
            )?;
            Ok(inserted > 0)
        })
    }
}

const SPELL_COLUMNS: &str = "SELECT id, name, slug, classes, level, school, cast_time, \
     range, duration, verbal, somatic, material, material_cost, description, created_at \
     FROM spells";

fn row_to_monster(row: &rusqlite::Row<'_>) -> std::result::Result<MonsterRow, rusqlite::Error> {
    Ok(MonsterRow {
        id: row.get(0)?,
        name: row.get(1)?,
        url: row.get(2)?,
        cr: row.get(3)?,
        kind: row.get(4)?,
        ac: row.get(5)?,
        hp: row.get(6)?,
        created_at: row.get(7)?,
    })
}

fn row_to_spell(row: &rusqlite::Row<'_>) -> std::result::Result<SpellRow, rusqlite::Error> {
    Ok(SpellRow {
        id: row.get(0)?,
        name: row.get(1)?,
        slug: row.get(2)?,
        classes: row.get(3)?,
        level: row.get(4)?,
        school: row.get(5)?,
        cast_time: row.get(6)?,
        range: row.get(7)?,
        duration: row.get(8)?,
        verbal: row.get(9)?,
        somatic: row.get(10)?,
        material: row.get(11)?,
        material_cost: row.get(12)?,
        description: row.get(13)?,
        created_at: row.get(14)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn goblin() -> NewMonster {
        NewMonster {
            name: "Goblin".to_string(),
            url: "https://example.com/goblin".to_string(),
            cr: "1/4".to_string(),
            kind: "humanoid".to_string(),
            ac: 15,
            hp: 7,
        }
    }

    #[test]
    fn monster_upsert_skips_existing_name() {
        let db = Database::open_in_memory().unwrap();

        assert!(db.insert_monster_if_new(&goblin()).unwrap());
        // Second load of the same dataset must not duplicate or overwrite.
        let mut changed = goblin();
        changed.hp = 99;
        assert!(!db.insert_monster_if_new(&changed).unwrap());

        let monsters = db.list_monsters().unwrap();
        assert_eq!(monsters.len(), 1);
        assert_eq!(monsters[0].hp, 7);
    }

    #[test]
    fn spell_lookup_by_slug() {
        let db = Database::open_in_memory().unwrap();
        let spell = NewSpell {
            name: "Mage Hand".to_string(),
            slug: "mage-hand".to_string(),
            classes: r#"["Bard","Wizard"]"#.to_string(),
            level: 0,
            school: "Conjuration".to_string(),
            cast_time: "1 action".to_string(),
            range: "30 feet".to_string(),
            duration: "1 minute".to_string(),
            verbal: true,
            somatic: true,
            material: false,
            material_cost: None,
            description: "A spectral, floating hand appears.".to_string(),
        };

        assert!(db.insert_spell_if_new(&spell).unwrap());
        assert!(!db.insert_spell_if_new(&spell).unwrap());

        let row = db.get_spell_by_slug("mage-hand").unwrap();
        assert_eq!(row.name, "Mage Hand");
        assert!(row.verbal);

        assert!(matches!(
            db.get_spell_by_slug("wish"),
            Err(StoreError::NotFound)
        ));
    }
}

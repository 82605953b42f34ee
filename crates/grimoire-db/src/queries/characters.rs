use rusqlite::{Connection, OptionalExtension, params};

use grimoire_types::api::CharacterUpsert;

use crate::Database;
use crate::error::{Result, StoreError};
use crate::models::CharacterRow;

impl Database {
    pub fn create_character(&self, id: &str, owner: &str, c: &CharacterUpsert) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO player_characters
                    (id, user_id, character_name, player_name, character_race,
                     character_subrace, character_class, character_subclass, ac, hp, info)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                params![
                    id,
                    owner,
                    c.character_name,
                    c.player_name,
                    c.character_race,
                    c.character_subrace,
                    c.character_class,
                    c.character_subclass,
                    c.ac,
                    c.hp,
                    c.info,
                ],
            )?;
            Ok(())
        })
    }

    pub fn list_characters(&self, owner: &str) -> Result<Vec<CharacterRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "{CHARACTER_COLUMNS} WHERE user_id = ?1 ORDER BY character_name"
            ))?;

            let rows = stmt
                .query_map([owner], row_to_character)?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }

    /// Ownership-checked fetch: absent id is `NotFound`, someone else's
    /// character is `Forbidden`.
    pub fn get_character(&self, id: &str, owner: &str) -> Result<CharacterRow> {
        self.with_conn(|conn| {
            let row = query_character(conn, id)?.ok_or(StoreError::NotFound)?;
            if row.user_id != owner {
                return Err(StoreError::Forbidden);
            }
            Ok(row)
        })
    }

    /// Full replace of the mutable fields. The owner reference is immutable.
    pub fn update_character(&self, id: &str, owner: &str, c: &CharacterUpsert) -> Result<()> {
        self.with_conn(|conn| {
            let row = query_character(conn, id)?.ok_or(StoreError::NotFound)?;
            if row.user_id != owner {
                return Err(StoreError::Forbidden);
            }

            conn.execute(
                "UPDATE player_characters
                 SET character_name = ?1, player_name = ?2, character_race = ?3,
                     character_subrace = ?4, character_class = ?5, character_subclass = ?6,
                     ac = ?7, hp = ?8, info = ?9
                 WHERE id = ?10",
                params![
                    c.character_name,
                    c.player_name,
                    c.character_race,
                    c.character_subrace,
                    c.character_class,
                    c.character_subclass,
                    c.ac,
                    c.hp,
                    c.info,
                    id,
                ],
            )?;
            Ok(())
        })
    }

    /// Fails with `ReferentialIntegrity` while any encounter participant
    /// still links to this character.
    pub fn delete_character(&self, id: &str, owner: &str) -> Result<()> {
        self.with_conn(|conn| {
            let row = query_character(conn, id)?.ok_or(StoreError::NotFound)?;
            if row.user_id != owner {
                return Err(StoreError::Forbidden);
            }

            conn.execute("DELETE FROM player_characters WHERE id = ?1", [id])?;
            Ok(())
        })
    }
}

const CHARACTER_COLUMNS: &str = "SELECT id, user_id, character_name, player_name, \
     character_race, character_subrace, character_class, character_subclass, ac, hp, info, \
     created_at FROM player_characters";

fn query_character(conn: &Connection, id: &str) -> Result<Option<CharacterRow>> {
    let row = conn
        .query_row(
            &format!("{CHARACTER_COLUMNS} WHERE id = ?1"),
            [id],
            row_to_character,
        )
        .optional()?;

    Ok(row)
}

fn row_to_character(row: &rusqlite::Row<'_>) -> std::result::Result<CharacterRow, rusqlite::Error> {
    Ok(CharacterRow {
        id: row.get(0)?,
        user_id: row.get(1)?,
        character_name: row.get(2)?,
        player_name: row.get(3)?,
        character_race: row.get(4)?,
        character_subrace: row.get(5)?,
        character_class: row.get(6)?,
        character_subclass: row.get(7)?,
        ac: row.get(8)?,
        hp: row.get(9)?,
        info: row.get(10)?,
        created_at: row.get(11)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn upsert(name: &str) -> CharacterUpsert {
        CharacterUpsert {
            character_name: name.to_string(),
            player_name: "Sam".to_string(),
            character_race: "Elf".to_string(),
            character_subrace: None,
            character_class: "Wizard".to_string(),
            character_subclass: Some("Evocation".to_string()),
            ac: Some(15),
            hp: Some(22),
            info: None,
        }
    }

    fn seed_user(db: &Database, name: &str) -> String {
        let id = Uuid::new_v4().to_string();
        db.create_user(&id, name, "hash").unwrap();
        id
    }

    #[test]
    fn create_and_fetch_roundtrip() {
        let db = Database::open_in_memory().unwrap();
        let owner = seed_user(&db, "alice");
        let id = Uuid::new_v4().to_string();

        db.create_character(&id, &owner, &upsert("Taako")).unwrap();

        let row = db.get_character(&id, &owner).unwrap();
        assert_eq!(row.character_name, "Taako");
        assert_eq!(row.ac, Some(15));
        assert_eq!(row.character_subrace, None);
    }

    #[test]
    fn other_users_character_is_forbidden() {
        let db = Database::open_in_memory().unwrap();
        let alice = seed_user(&db, "alice");
        let bob = seed_user(&db, "bob");
        let id = Uuid::new_v4().to_string();
        db.create_character(&id, &alice, &upsert("Taako")).unwrap();

        assert!(matches!(
            db.get_character(&id, &bob),
            Err(StoreError::Forbidden)
        ));
        assert!(matches!(
            db.update_character(&id, &bob, &upsert("Stolen")),
            Err(StoreError::Forbidden)
        ));
        assert!(matches!(
            db.delete_character(&id, &bob),
            Err(StoreError::Forbidden)
        ));
    }

    #[test]
    fn update_replaces_fields_but_not_owner() {
        let db = Database::open_in_memory().unwrap();
        let owner = seed_user(&db, "alice");
        let id = Uuid::new_v4().to_string();
        db.create_character(&id, &owner, &upsert("Taako")).unwrap();

        let mut changed = upsert("Taako");
        changed.hp = Some(30);
        changed.character_subclass = None;
        db.update_character(&id, &owner, &changed).unwrap();

        let row = db.get_character(&id, &owner).unwrap();
        assert_eq!(row.hp, Some(30));
        assert_eq!(row.character_subclass, None);
        assert_eq!(row.user_id, owner);
    }

    #[test]
    fn missing_character_is_not_found() {
        let db = Database::open_in_memory().unwrap();
        let owner = seed_user(&db, "alice");
        let missing = Uuid::new_v4().to_string();

        assert!(matches!(
            db.get_character(&missing, &owner),
            Err(StoreError::NotFound)
        ));
    }
}

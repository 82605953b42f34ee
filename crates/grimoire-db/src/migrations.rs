use rusqlite::Connection;
use tracing::info;

use crate::error::Result;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version: i64 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |r| r.get(0),
    )?;

    if version < 1 {
        info!("Running migration v1 (initial schema)");
        conn.execute_batch(
            "
            CREATE TABLE users (
                id          TEXT PRIMARY KEY,
                username    TEXT NOT NULL UNIQUE,
                password    TEXT NOT NULL,
                created_at  TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE TABLE player_characters (
                id                  TEXT PRIMARY KEY,
                user_id             TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                character_name      TEXT NOT NULL,
                player_name         TEXT NOT NULL,
                character_race      TEXT NOT NULL,
                character_subrace   TEXT,
                character_class     TEXT NOT NULL,
                character_subclass  TEXT,
                ac                  INTEGER,
                hp                  INTEGER,
                info                TEXT,
                created_at          TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE INDEX idx_player_characters_user
                ON player_characters(user_id);

            CREATE TABLE monsters (
                id          TEXT PRIMARY KEY,
                name        TEXT NOT NULL UNIQUE,
                url         TEXT NOT NULL,
                cr          TEXT NOT NULL,
                type        TEXT NOT NULL,
                ac          INTEGER NOT NULL,
                hp          INTEGER NOT NULL,
                created_at  TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE TABLE spells (
                id              TEXT PRIMARY KEY,
                name            TEXT NOT NULL UNIQUE,
                slug            TEXT NOT NULL UNIQUE,
                classes         TEXT NOT NULL,
                level           INTEGER NOT NULL,
                school          TEXT NOT NULL,
                cast_time       TEXT NOT NULL,
                range           TEXT NOT NULL,
                duration        TEXT NOT NULL,
                verbal          INTEGER NOT NULL DEFAULT 0,
                somatic         INTEGER NOT NULL DEFAULT 0,
                material        INTEGER NOT NULL DEFAULT 0,
                material_cost   TEXT,
                description     TEXT NOT NULL,
                created_at      TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE INDEX idx_spells_slug ON spells(slug);

            CREATE TABLE encounters (
                id          TEXT PRIMARY KEY,
                user_id     TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                name        TEXT NOT NULL,
                description TEXT,
                created_at  TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE INDEX idx_encounters_user ON encounters(user_id);

            -- Participant rows are owned by exactly one encounter and die
            -- with it. The optional compendium link is protected: a character
            -- or monster cannot be deleted while a participant references it.
            CREATE TABLE player_participants (
                id                   TEXT PRIMARY KEY,
                encounter_id         TEXT NOT NULL REFERENCES encounters(id) ON DELETE CASCADE,
                player_character_id  TEXT REFERENCES player_characters(id) ON DELETE RESTRICT,
                name                 TEXT,
                initiative           INTEGER,
                current_hp           INTEGER,
                ac                   INTEGER,
                notes                TEXT
            );

            CREATE INDEX idx_player_participants_encounter
                ON player_participants(encounter_id);

            CREATE TABLE monster_participants (
                id            TEXT PRIMARY KEY,
                encounter_id  TEXT NOT NULL REFERENCES encounters(id) ON DELETE CASCADE,
                monster_id    TEXT REFERENCES monsters(id) ON DELETE RESTRICT,
                name          TEXT,
                initiative    INTEGER,
                current_hp    INTEGER,
                ac            INTEGER,
                notes         TEXT
            );

            CREATE INDEX idx_monster_participants_encounter
                ON monster_participants(encounter_id);

            INSERT INTO schema_version (version) VALUES (1);
            ",
        )?;
    }

    info!("Database migrations complete");
    Ok(())
}

//! Encounter aggregate write path.
//!
//! An encounter owns two child collections (player participants, monster
//! participants). Writes are snapshot-based: the caller submits the full
//! desired list per kind and the store is reconciled to exactly match it —
//! rows carrying a known id are updated in place, rows without an id are
//! inserted fresh, and stored rows absent from the submitted list are
//! deleted. All child mutations for one call happen inside a single
//! transaction; an error anywhere rolls the whole write back.
//!
//! Concurrency: writers are serialized by the connection mutex, so two
//! in-process calls against the same encounter cannot compute deletion
//! sweeps from stale snapshots. Running several processes against one SQLite
//! file weakens this to SQLite's file locking; a second writer then fails
//! with `Conflict` rather than silently losing updates.

use std::collections::HashMap;

use rusqlite::{Connection, OptionalExtension, Transaction, params};
use uuid::Uuid;

use grimoire_types::api::{
    CreateEncounterRequest, MonsterParticipantUpsert, PlayerParticipantUpsert,
    UpdateEncounterRequest,
};
use grimoire_types::patch::Patch;

use crate::Database;
use crate::error::{Result, StoreError};
use crate::models::{EncounterDetail, EncounterRow, MonsterParticipantRow, PlayerParticipantRow};

/// Table wiring for one participant kind. Players and monsters run the same
/// reconciliation algorithm and differ only in the table they live in and
/// the compendium table their optional link points at.
struct ParticipantKind {
    table: &'static str,
    link_col: &'static str,
    link_table: &'static str,
}

const PLAYERS: ParticipantKind = ParticipantKind {
    table: "player_participants",
    link_col: "player_character_id",
    link_table: "player_characters",
};

const MONSTERS: ParticipantKind = ParticipantKind {
    table: "monster_participants",
    link_col: "monster_id",
    link_table: "monsters",
};

/// Kind-independent view of one submitted participant row.
struct ParticipantPatch {
    id: Option<String>,
    link: Patch<String>,
    name: Patch<String>,
    initiative: Patch<i32>,
    current_hp: Patch<i32>,
    ac: Patch<i32>,
    notes: Patch<String>,
}

impl From<&PlayerParticipantUpsert> for ParticipantPatch {
    fn from(p: &PlayerParticipantUpsert) -> Self {
        Self {
            id: p.id.map(|u| u.to_string()),
            link: p.player_character_id.map(|o| o.map(|u| u.to_string())),
            name: p.name.clone(),
            initiative: p.initiative,
            current_hp: p.current_hp,
            ac: p.ac,
            notes: p.notes.clone(),
        }
    }
}

impl From<&MonsterParticipantUpsert> for ParticipantPatch {
    fn from(p: &MonsterParticipantUpsert) -> Self {
        Self {
            id: p.id.map(|u| u.to_string()),
            link: p.monster_id.map(|o| o.map(|u| u.to_string())),
            name: p.name.clone(),
            initiative: p.initiative,
            current_hp: p.current_hp,
            ac: p.ac,
            notes: p.notes.clone(),
        }
    }
}

/// Current stored values of one participant row, loaded before a partial
/// update so that attributes the patch leaves untouched keep their value.
struct ParticipantRecord {
    link: Option<String>,
    name: Option<String>,
    initiative: Option<i32>,
    current_hp: Option<i32>,
    ac: Option<i32>,
    notes: Option<String>,
}

impl Database {
    pub fn list_encounters(&self, owner: &str) -> Result<Vec<EncounterDetail>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, user_id, name, description, created_at
                 FROM encounters WHERE user_id = ?1
                 ORDER BY created_at DESC, id",
            )?;

            let encounters = stmt
                .query_map([owner], row_to_encounter)?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            let ids: Vec<String> = encounters.iter().map(|e| e.id.clone()).collect();
            let mut players = load_player_rows(conn, &ids)?;
            let mut monsters = load_monster_rows(conn, &ids)?;

            Ok(encounters
                .into_iter()
                .map(|encounter| EncounterDetail {
                    players: players.remove(&encounter.id).unwrap_or_default(),
                    monsters: monsters.remove(&encounter.id).unwrap_or_default(),
                    encounter,
                })
                .collect())
        })
    }

    pub fn get_encounter(&self, id: &str, owner: &str) -> Result<EncounterDetail> {
        self.with_conn(|conn| read_detail_checked(conn, id, owner))
    }

    /// Create an encounter together with its initial participants. Any id
    /// present on a submitted participant is ignored; every row is created
    /// fresh under the new encounter.
    pub fn create_encounter(
        &self,
        owner: &str,
        req: &CreateEncounterRequest,
    ) -> Result<EncounterDetail> {
        let encounter_id = Uuid::new_v4().to_string();

        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            tx.execute(
                "INSERT INTO encounters (id, user_id, name, description)
                 VALUES (?1, ?2, ?3, ?4)",
                params![encounter_id, owner, req.name, req.description],
            )?;

            for p in &req.player_data {
                insert_participant(&tx, &PLAYERS, &encounter_id, &p.into())?;
            }
            for m in &req.monster_data {
                insert_participant(&tx, &MONSTERS, &encounter_id, &m.into())?;
            }

            tx.commit()?;
            read_detail_checked(conn, &encounter_id, owner)
        })
    }

    /// Resynchronize one encounter to the submitted snapshot. Scalar fields
    /// update when supplied; both participant collections are reconciled to
    /// exactly match the submitted lists. The whole write is one transaction
    /// and the result is re-read from the store after commit.
    pub fn update_encounter(
        &self,
        id: &str,
        owner: &str,
        req: &UpdateEncounterRequest,
    ) -> Result<EncounterDetail> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let encounter = load_encounter(&tx, id)?.ok_or(StoreError::NotFound)?;
            if encounter.user_id != owner {
                return Err(StoreError::Forbidden);
            }

            if let Some(name) = &req.name {
                tx.execute(
                    "UPDATE encounters SET name = ?1 WHERE id = ?2",
                    params![name, id],
                )?;
            }
            if let Some(description) = &req.description {
                tx.execute(
                    "UPDATE encounters SET description = ?1 WHERE id = ?2",
                    params![description, id],
                )?;
            }

            let players: Vec<ParticipantPatch> = req.player_data.iter().map(Into::into).collect();
            reconcile_participants(&tx, &PLAYERS, id, &players)?;

            let monsters: Vec<ParticipantPatch> =
                req.monster_data.iter().map(Into::into).collect();
            reconcile_participants(&tx, &MONSTERS, id, &monsters)?;

            tx.commit()?;
            read_detail_checked(conn, id, owner)
        })
    }

    /// Participants die with the encounter (cascade).
    pub fn delete_encounter(&self, id: &str, owner: &str) -> Result<()> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let encounter = load_encounter(&tx, id)?.ok_or(StoreError::NotFound)?;
            if encounter.user_id != owner {
                return Err(StoreError::Forbidden);
            }

            tx.execute("DELETE FROM encounters WHERE id = ?1", [id])?;
            tx.commit()?;
            Ok(())
        })
    }
}

/// Drive the stored rows of one kind to exactly match the submitted list:
/// update rows with a matching id, insert rows without one, then delete
/// every stored row whose id did not survive.
fn reconcile_participants(
    tx: &Transaction<'_>,
    kind: &ParticipantKind,
    encounter_id: &str,
    submitted: &[ParticipantPatch],
) -> Result<()> {
    let mut surviving: Vec<String> = Vec::with_capacity(submitted.len());

    for p in submitted {
        let id = match &p.id {
            Some(pid) => update_participant(tx, kind, encounter_id, pid, p)?,
            None => insert_participant(tx, kind, encounter_id, p)?,
        };
        surviving.push(id);
    }

    sweep_missing(tx, kind, encounter_id, &surviving)
}

fn update_participant(
    tx: &Transaction<'_>,
    kind: &ParticipantKind,
    encounter_id: &str,
    pid: &str,
    p: &ParticipantPatch,
) -> Result<String> {
    // The lookup is scoped to this encounter: an id that exists under a
    // different encounter reads as absent, never as a row to adopt.
    let sql = format!(
        "SELECT {}, name, initiative, current_hp, ac, notes
         FROM {} WHERE id = ?1 AND encounter_id = ?2",
        kind.link_col, kind.table,
    );
    let mut rec = tx
        .query_row(&sql, params![pid, encounter_id], |row| {
            Ok(ParticipantRecord {
                link: row.get(0)?,
                name: row.get(1)?,
                initiative: row.get(2)?,
                current_hp: row.get(3)?,
                ac: row.get(4)?,
                notes: row.get(5)?,
            })
        })
        .optional()?
        .ok_or(StoreError::NotFound)?;

    if let Some(Some(link_id)) = &p.link {
        ensure_link_exists(tx, kind, link_id)?;
    }

    if let Some(link) = &p.link {
        rec.link = link.clone();
    }
    if let Some(name) = &p.name {
        rec.name = name.clone();
    }
    if let Some(initiative) = p.initiative {
        rec.initiative = initiative;
    }
    if let Some(current_hp) = p.current_hp {
        rec.current_hp = current_hp;
    }
    if let Some(ac) = p.ac {
        rec.ac = ac;
    }
    if let Some(notes) = &p.notes {
        rec.notes = notes.clone();
    }

    let sql = format!(
        "UPDATE {} SET {} = ?1, name = ?2, initiative = ?3, current_hp = ?4, ac = ?5, notes = ?6
         WHERE id = ?7 AND encounter_id = ?8",
        kind.table, kind.link_col,
    );
    tx.execute(
        &sql,
        params![
            rec.link,
            rec.name,
            rec.initiative,
            rec.current_hp,
            rec.ac,
            rec.notes,
            pid,
            encounter_id,
        ],
    )?;

    Ok(pid.to_string())
}

/// Insert a fresh participant row under its own generated id. Any id the
/// client put on the descriptor is ignored, so a submitted id can never
/// collide with or adopt an existing row.
fn insert_participant(
    tx: &Transaction<'_>,
    kind: &ParticipantKind,
    encounter_id: &str,
    p: &ParticipantPatch,
) -> Result<String> {
    let link = p.link.clone().flatten();
    if let Some(link_id) = &link {
        ensure_link_exists(tx, kind, link_id)?;
    }

    let id = Uuid::new_v4().to_string();
    let sql = format!(
        "INSERT INTO {} (id, encounter_id, {}, name, initiative, current_hp, ac, notes)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        kind.table, kind.link_col,
    );
    tx.execute(
        &sql,
        params![
            id,
            encounter_id,
            link,
            p.name.clone().flatten(),
            p.initiative.flatten(),
            p.current_hp.flatten(),
            p.ac.flatten(),
            p.notes.clone().flatten(),
        ],
    )?;

    Ok(id)
}

/// A link pointing at a compendium entry that does not exist is rejected
/// outright, never silently nulled.
fn ensure_link_exists(tx: &Transaction<'_>, kind: &ParticipantKind, link_id: &str) -> Result<()> {
    let sql = format!(
        "SELECT EXISTS(SELECT 1 FROM {} WHERE id = ?1)",
        kind.link_table
    );
    let exists: bool = tx.query_row(&sql, [link_id], |r| r.get(0))?;

    if exists {
        Ok(())
    } else {
        Err(StoreError::Validation(format!(
            "unknown {}: {}",
            kind.link_col, link_id
        )))
    }
}

/// Deletion sweep: remove every stored row for this encounter whose id is
/// not in the surviving set.
fn sweep_missing(
    tx: &Transaction<'_>,
    kind: &ParticipantKind,
    encounter_id: &str,
    surviving: &[String],
) -> Result<()> {
    if surviving.is_empty() {
        let sql = format!("DELETE FROM {} WHERE encounter_id = ?1", kind.table);
        tx.execute(&sql, [encounter_id])?;
        return Ok(());
    }

    let placeholders: Vec<String> = (2..=surviving.len() + 1).map(|i| format!("?{i}")).collect();
    let sql = format!(
        "DELETE FROM {} WHERE encounter_id = ?1 AND id NOT IN ({})",
        kind.table,
        placeholders.join(", ")
    );

    let encounter_id = encounter_id.to_string();
    let mut sql_params: Vec<&dyn rusqlite::types::ToSql> = Vec::with_capacity(surviving.len() + 1);
    sql_params.push(&encounter_id);
    for id in surviving {
        sql_params.push(id);
    }

    tx.execute(&sql, sql_params.as_slice())?;
    Ok(())
}

fn row_to_encounter(row: &rusqlite::Row<'_>) -> std::result::Result<EncounterRow, rusqlite::Error> {
    Ok(EncounterRow {
        id: row.get(0)?,
        user_id: row.get(1)?,
        name: row.get(2)?,
        description: row.get(3)?,
        created_at: row.get(4)?,
    })
}

fn load_encounter(conn: &Connection, id: &str) -> Result<Option<EncounterRow>> {
    let row = conn
        .query_row(
            "SELECT id, user_id, name, description, created_at
             FROM encounters WHERE id = ?1",
            [id],
            row_to_encounter,
        )
        .optional()?;

    Ok(row)
}

fn read_detail_checked(conn: &Connection, id: &str, owner: &str) -> Result<EncounterDetail> {
    let encounter = load_encounter(conn, id)?.ok_or(StoreError::NotFound)?;
    if encounter.user_id != owner {
        return Err(StoreError::Forbidden);
    }

    let ids = vec![encounter.id.clone()];
    let mut players = load_player_rows(conn, &ids)?;
    let mut monsters = load_monster_rows(conn, &ids)?;

    Ok(EncounterDetail {
        players: players.remove(id).unwrap_or_default(),
        monsters: monsters.remove(id).unwrap_or_default(),
        encounter,
    })
}

/// Batch-fetch player participants for a set of encounters, grouped by
/// encounter id. JOINs the character roster for display names in one query.
fn load_player_rows(
    conn: &Connection,
    encounter_ids: &[String],
) -> Result<HashMap<String, Vec<PlayerParticipantRow>>> {
    if encounter_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let placeholders: Vec<String> = (1..=encounter_ids.len()).map(|i| format!("?{i}")).collect();
    let sql = format!(
        "SELECT p.id, p.encounter_id, p.player_character_id, c.character_name,
                p.name, p.initiative, p.current_hp, p.ac, p.notes
         FROM player_participants p
         LEFT JOIN player_characters c ON p.player_character_id = c.id
         WHERE p.encounter_id IN ({})
         ORDER BY p.initiative IS NULL, p.initiative DESC",
        placeholders.join(", ")
    );

    let mut stmt = conn.prepare(&sql)?;
    let sql_params: Vec<&dyn rusqlite::types::ToSql> = encounter_ids
        .iter()
        .map(|id| id as &dyn rusqlite::types::ToSql)
        .collect();

    let rows = stmt
        .query_map(sql_params.as_slice(), |row| {
            Ok(PlayerParticipantRow {
                id: row.get(0)?,
                encounter_id: row.get(1)?,
                player_character_id: row.get(2)?,
                character_name: row.get(3)?,
                name: row.get(4)?,
                initiative: row.get(5)?,
                current_hp: row.get(6)?,
                ac: row.get(7)?,
                notes: row.get(8)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let mut grouped: HashMap<String, Vec<PlayerParticipantRow>> = HashMap::new();
    for r in rows {
        grouped.entry(r.encounter_id.clone()).or_default().push(r);
    }

    Ok(grouped)
}

/// Same as [`load_player_rows`] for the monster collection.
fn load_monster_rows(
    conn: &Connection,
    encounter_ids: &[String],
) -> Result<HashMap<String, Vec<MonsterParticipantRow>>> {
    if encounter_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let placeholders: Vec<String> = (1..=encounter_ids.len()).map(|i| format!("?{i}")).collect();
    let sql = format!(
        "SELECT p.id, p.encounter_id, p.monster_id, m.name,
                p.name, p.initiative, p.current_hp, p.ac, p.notes
         FROM monster_participants p
         LEFT JOIN monsters m ON p.monster_id = m.id
         WHERE p.encounter_id IN ({})
         ORDER BY p.initiative IS NULL, p.initiative DESC",
        placeholders.join(", ")
    );

    let mut stmt = conn.prepare(&sql)?;
    let sql_params: Vec<&dyn rusqlite::types::ToSql> = encounter_ids
        .iter()
        .map(|id| id as &dyn rusqlite::types::ToSql)
        .collect();

    let rows = stmt
        .query_map(sql_params.as_slice(), |row| {
            Ok(MonsterParticipantRow {
                id: row.get(0)?,
                encounter_id: row.get(1)?,
                monster_id: row.get(2)?,
                monster_name: row.get(3)?,
                name: row.get(4)?,
                initiative: row.get(5)?,
                current_hp: row.get(6)?,
                ac: row.get(7)?,
                notes: row.get(8)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let mut grouped: HashMap<String, Vec<MonsterParticipantRow>> = HashMap::new();
    for r in rows {
        grouped.entry(r.encounter_id.clone()).or_default().push(r);
    }

    Ok(grouped)
}

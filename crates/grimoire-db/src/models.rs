//! Database row types — these map directly to SQLite rows.
//! Distinct from the grimoire-types API shapes to keep the DB layer
//! independent of the wire format.

pub struct UserRow {
    pub id: String,
    pub username: String,
    pub password: String,
    pub created_at: String,
}

pub struct CharacterRow {
    pub id: String,
    pub user_id: String,
    pub character_name: String,
    pub player_name: String,
    pub character_race: String,
    pub character_subrace: Option<String>,
    pub character_class: String,
    pub character_subclass: Option<String>,
    pub ac: Option<i32>,
    pub hp: Option<i32>,
    pub info: Option<String>,
    pub created_at: String,
}

pub struct MonsterRow {
    pub id: String,
    pub name: String,
    pub url: String,
    pub cr: String,
    pub kind: String,
    pub ac: i32,
    pub hp: i32,
    pub created_at: String,
}

/// Insert shape for the bulk loader. Matched on `name`.
pub struct NewMonster {
    pub name: String,
    pub url: String,
    pub cr: String,
    pub kind: String,
    pub ac: i32,
    pub hp: i32,
}

pub struct SpellRow {
    pub id: String,
    pub name: String,
    pub slug: String,
    /// JSON array of class names, stored verbatim.
    pub classes: String,
    pub level: i32,
    pub school: String,
    pub cast_time: String,
    pub range: String,
    pub duration: String,
    pub verbal: bool,
    pub somatic: bool,
    pub material: bool,
    pub material_cost: Option<String>,
    pub description: String,
    pub created_at: String,
}

/// Insert shape for the bulk loader. Matched on `name`.
pub struct NewSpell {
    pub name: String,
    pub slug: String,
    pub classes: String,
    pub level: i32,
    pub school: String,
    pub cast_time: String,
    pub range: String,
    pub duration: String,
    pub verbal: bool,
    pub somatic: bool,
    pub material: bool,
    pub material_cost: Option<String>,
    pub description: String,
}

pub struct EncounterRow {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub description: Option<String>,
    pub created_at: String,
}

pub struct PlayerParticipantRow {
    pub id: String,
    pub encounter_id: String,
    pub player_character_id: Option<String>,
    /// Display name of the linked character, joined in for responses.
    pub character_name: Option<String>,
    pub name: Option<String>,
    pub initiative: Option<i32>,
    pub current_hp: Option<i32>,
    pub ac: Option<i32>,
    pub notes: Option<String>,
}

pub struct MonsterParticipantRow {
    pub id: String,
    pub encounter_id: String,
    pub monster_id: Option<String>,
    /// Compendium name of the linked monster, joined in for responses.
    pub monster_name: Option<String>,
    pub name: Option<String>,
    pub initiative: Option<i32>,
    pub current_hp: Option<i32>,
    pub ac: Option<i32>,
    pub notes: Option<String>,
}

/// An encounter with both participant collections, as re-read from the
/// store after a write.
pub struct EncounterDetail {
    pub encounter: EncounterRow,
    pub players: Vec<PlayerParticipantRow>,
    pub monsters: Vec<MonsterParticipantRow>,
}

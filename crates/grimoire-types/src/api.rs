use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::patch::{Patch, patch};

// -- JWT Claims --

/// JWT claims shared between the REST middleware and the auth handlers.
/// Canonical definition lives here in grimoire-types to eliminate
/// duplication.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub username: String,
    pub exp: usize,
}

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub user_id: Uuid,
    pub token: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user_id: Uuid,
    pub username: String,
    pub token: String,
}

// -- Player characters --

/// Write shape for a character, used by both create and full update. The
/// owner is always taken from the authenticated caller, never the body.
#[derive(Debug, Clone, Deserialize)]
pub struct CharacterUpsert {
    pub character_name: String,
    pub player_name: String,
    pub character_race: String,
    #[serde(default)]
    pub character_subrace: Option<String>,
    pub character_class: String,
    #[serde(default)]
    pub character_subclass: Option<String>,
    #[serde(default)]
    pub ac: Option<i32>,
    #[serde(default)]
    pub hp: Option<i32>,
    #[serde(default)]
    pub info: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CharacterResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub character_name: String,
    pub player_name: String,
    pub character_race: String,
    pub character_subrace: Option<String>,
    pub character_class: String,
    pub character_subclass: Option<String>,
    pub ac: Option<i32>,
    pub hp: Option<i32>,
    pub info: Option<String>,
}

// -- Compendium --

#[derive(Debug, Serialize)]
pub struct MonsterResponse {
    pub id: Uuid,
    pub name: String,
    pub url: String,
    pub cr: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub ac: i32,
    pub hp: i32,
}

#[derive(Debug, Serialize)]
pub struct SpellResponse {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub classes: Vec<String>,
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

// -- Encounters --

/// One submitted participant row. With an `id` it targets an existing row
/// under the same encounter; without one it always creates a new row.
///
/// Every mutable attribute is a [`Patch`]: omitted keeps the stored value,
/// `null` clears it, a value overwrites it. Unknown keys (such as the nested
/// read-only `player_character` object echoed back from a GET) are ignored so
/// a fetched encounter can be edited and resubmitted as-is.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlayerParticipantUpsert {
    #[serde(default)]
    pub id: Option<Uuid>,
    #[serde(default, deserialize_with = "patch")]
    pub player_character_id: Patch<Uuid>,
    #[serde(default, deserialize_with = "patch")]
    pub name: Patch<String>,
    #[serde(default, deserialize_with = "patch")]
    pub initiative: Patch<i32>,
    #[serde(default, deserialize_with = "patch")]
    pub current_hp: Patch<i32>,
    #[serde(default, deserialize_with = "patch")]
    pub ac: Patch<i32>,
    #[serde(default, deserialize_with = "patch")]
    pub notes: Patch<String>,
}

/// Same shape as [`PlayerParticipantUpsert`], keyed to the monster
/// compendium instead of the character roster.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MonsterParticipantUpsert {
    #[serde(default)]
    pub id: Option<Uuid>,
    #[serde(default, deserialize_with = "patch")]
    pub monster_id: Patch<Uuid>,
    #[serde(default, deserialize_with = "patch")]
    pub name: Patch<String>,
    #[serde(default, deserialize_with = "patch")]
    pub initiative: Patch<i32>,
    #[serde(default, deserialize_with = "patch")]
    pub current_hp: Patch<i32>,
    #[serde(default, deserialize_with = "patch")]
    pub ac: Patch<i32>,
    #[serde(default, deserialize_with = "patch")]
    pub notes: Patch<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateEncounterRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub player_data: Vec<PlayerParticipantUpsert>,
    #[serde(default)]
    pub monster_data: Vec<MonsterParticipantUpsert>,
}

/// Update is a full resynchronization of both participant collections: the
/// stored rows are reconciled to exactly match the submitted lists. An
/// omitted list is treated as empty and clears that collection.
#[derive(Debug, Deserialize)]
pub struct UpdateEncounterRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "patch")]
    pub description: Patch<String>,
    #[serde(default)]
    pub player_data: Vec<PlayerParticipantUpsert>,
    #[serde(default)]
    pub monster_data: Vec<MonsterParticipantUpsert>,
}

/// Nested read-only view of a linked character.
#[derive(Debug, Serialize)]
pub struct CharacterRef {
    pub id: Uuid,
    pub character_name: String,
}

/// Nested read-only view of a linked compendium monster.
#[derive(Debug, Serialize)]
pub struct MonsterRef {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct PlayerParticipantResponse {
    pub id: Uuid,
    pub player_character: Option<CharacterRef>,
    pub name: Option<String>,
    pub initiative: Option<i32>,
    pub current_hp: Option<i32>,
    pub ac: Option<i32>,
    pub notes: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MonsterParticipantResponse {
    pub id: Uuid,
    pub monster: Option<MonsterRef>,
    pub name: Option<String>,
    pub initiative: Option<i32>,
    pub current_hp: Option<i32>,
    pub ac: Option<i32>,
    pub notes: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct EncounterResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub player_data: Vec<PlayerParticipantResponse>,
    pub monster_data: Vec<MonsterParticipantResponse>,
}

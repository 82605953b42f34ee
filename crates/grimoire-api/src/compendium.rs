use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use tracing::warn;
use uuid::Uuid;

use grimoire_db::models::{MonsterRow, SpellRow};
use grimoire_types::api::{MonsterResponse, SpellResponse};

use crate::auth::AppState;
use crate::error::ApiError;
use crate::uuid_or_nil;

pub async fn list_monsters(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let rows = state.db.list_monsters()?;

    Ok(Json(
        rows.into_iter().map(monster_to_response).collect::<Vec<_>>(),
    ))
}

pub async fn get_monster(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let row = state.db.get_monster(&id.to_string())?;

    Ok(Json(monster_to_response(row)))
}

pub async fn list_spells(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let rows = state.db.list_spells()?;

    Ok(Json(
        rows.into_iter().map(spell_to_response).collect::<Vec<_>>(),
    ))
}

/// Spell detail is addressed by slug rather than id.
pub async fn get_spell(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let row = state.db.get_spell_by_slug(&slug)?;

    Ok(Json(spell_to_response(row)))
}

fn monster_to_response(row: MonsterRow) -> MonsterResponse {
    MonsterResponse {
        id: uuid_or_nil(&row.id, "monster id"),
        name: row.name,
        url: row.url,
        cr: row.cr,
        kind: row.kind,
        ac: row.ac,
        hp: row.hp,
    }
}

fn spell_to_response(row: SpellRow) -> SpellResponse {
    // Stored as a JSON array; tolerate hand-edited rows.
    let classes: Vec<String> = serde_json::from_str(&row.classes).unwrap_or_else(|e| {
        warn!("Corrupt classes on spell '{}': {}", row.id, e);
        Vec::new()
    });

    SpellResponse {
        id: uuid_or_nil(&row.id, "spell id"),
        name: row.name,
        slug: row.slug,
        classes,
        level: row.level,
        school: row.school,
        cast_time: row.cast_time,
        range: row.range,
        duration: row.duration,
        verbal: row.verbal,
        somatic: row.somatic,
        material: row.material,
        material_cost: row.material_cost,
        description: row.description,
    }
}

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::error;
use uuid::Uuid;

use grimoire_db::models::{EncounterDetail, MonsterParticipantRow, PlayerParticipantRow};
use grimoire_types::api::{
    CharacterRef, Claims, CreateEncounterRequest, EncounterResponse, MonsterParticipantResponse,
    MonsterRef, PlayerParticipantResponse, UpdateEncounterRequest,
};

use crate::auth::AppState;
use crate::error::ApiError;
use crate::uuid_or_nil;

pub async fn list_encounters(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    // Run blocking DB reads off the async runtime
    let db = state.clone();
    let owner = claims.sub.to_string();
    let details = tokio::task::spawn_blocking(move || db.db.list_encounters(&owner))
        .await
        .map_err(join_err)??;

    Ok(Json(
        details.into_iter().map(to_response).collect::<Vec<_>>(),
    ))
}

pub async fn create_encounter(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreateEncounterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let owner = claims.sub.to_string();
    let detail = tokio::task::spawn_blocking(move || db.db.create_encounter(&owner, &req))
        .await
        .map_err(join_err)??;

    Ok((StatusCode::CREATED, Json(to_response(detail))))
}

pub async fn get_encounter(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let owner = claims.sub.to_string();
    let detail =
        tokio::task::spawn_blocking(move || db.db.get_encounter(&id.to_string(), &owner))
            .await
            .map_err(join_err)??;

    Ok(Json(to_response(detail)))
}

/// Full resynchronization: stored participants are reconciled to exactly
/// match the submitted lists, and the response is the aggregate as re-read
/// from the store.
pub async fn update_encounter(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<UpdateEncounterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let owner = claims.sub.to_string();
    let detail =
        tokio::task::spawn_blocking(move || db.db.update_encounter(&id.to_string(), &owner, &req))
            .await
            .map_err(join_err)??;

    Ok(Json(to_response(detail)))
}

pub async fn delete_encounter(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .db
        .delete_encounter(&id.to_string(), &claims.sub.to_string())?;

    Ok(StatusCode::NO_CONTENT)
}

fn join_err(e: tokio::task::JoinError) -> ApiError {
    error!("spawn_blocking join error: {}", e);
    ApiError::Internal(anyhow::anyhow!("spawn_blocking join error: {e}"))
}

fn to_response(detail: EncounterDetail) -> EncounterResponse {
    EncounterResponse {
        id: uuid_or_nil(&detail.encounter.id, "encounter id"),
        user_id: uuid_or_nil(&detail.encounter.user_id, "encounter user_id"),
        name: detail.encounter.name,
        description: detail.encounter.description,
        player_data: detail.players.into_iter().map(player_to_response).collect(),
        monster_data: detail
            .monsters
            .into_iter()
            .map(monster_to_response)
            .collect(),
    }
}

fn player_to_response(row: PlayerParticipantRow) -> PlayerParticipantResponse {
    let player_character = match (row.player_character_id, row.character_name) {
        (Some(id), Some(character_name)) => Some(CharacterRef {
            id: uuid_or_nil(&id, "linked character id"),
            character_name,
        }),
        _ => None,
    };

    PlayerParticipantResponse {
        id: uuid_or_nil(&row.id, "participant id"),
        player_character,
        name: row.name,
        initiative: row.initiative,
        current_hp: row.current_hp,
        ac: row.ac,
        notes: row.notes,
    }
}

fn monster_to_response(row: MonsterParticipantRow) -> MonsterParticipantResponse {
    let monster = match (row.monster_id, row.monster_name) {
        (Some(id), Some(name)) => Some(MonsterRef {
            id: uuid_or_nil(&id, "linked monster id"),
            name,
        }),
        _ => None,
    };

    MonsterParticipantResponse {
        id: uuid_or_nil(&row.id, "participant id"),
        monster,
        name: row.name,
        initiative: row.initiative,
        current_hp: row.current_hp,
        ac: row.ac,
        notes: row.notes,
    }
}

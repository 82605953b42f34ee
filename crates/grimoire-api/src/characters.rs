use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

use grimoire_db::models::CharacterRow;
use grimoire_types::api::{CharacterResponse, CharacterUpsert, Claims};

use crate::auth::AppState;
use crate::error::ApiError;
use crate::uuid_or_nil;

pub async fn list_characters(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let rows = state.db.list_characters(&claims.sub.to_string())?;

    Ok(Json(
        rows.into_iter().map(to_response).collect::<Vec<_>>(),
    ))
}

pub async fn create_character(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CharacterUpsert>,
) -> Result<impl IntoResponse, ApiError> {
    let owner = claims.sub.to_string();
    let id = Uuid::new_v4().to_string();

    state.db.create_character(&id, &owner, &req)?;
    let row = state.db.get_character(&id, &owner)?;

    Ok((StatusCode::CREATED, Json(to_response(row))))
}

pub async fn get_character(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let row = state
        .db
        .get_character(&id.to_string(), &claims.sub.to_string())?;

    Ok(Json(to_response(row)))
}

pub async fn update_character(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CharacterUpsert>,
) -> Result<impl IntoResponse, ApiError> {
    let owner = claims.sub.to_string();
    let id = id.to_string();

    state.db.update_character(&id, &owner, &req)?;
    let row = state.db.get_character(&id, &owner)?;

    Ok(Json(to_response(row)))
}

pub async fn delete_character(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .db
        .delete_character(&id.to_string(), &claims.sub.to_string())?;

    Ok(StatusCode::NO_CONTENT)
}

fn to_response(row: CharacterRow) -> CharacterResponse {
    CharacterResponse {
        id: uuid_or_nil(&row.id, "character id"),
        user_id: uuid_or_nil(&row.user_id, "character user_id"),
        character_name: row.character_name,
        player_name: row.player_name,
        character_race: row.character_race,
        character_subrace: row.character_subrace,
        character_class: row.character_class,
        character_subclass: row.character_subclass,
        ac: row.ac,
        hp: row.hp,
        info: row.info,
    }
}

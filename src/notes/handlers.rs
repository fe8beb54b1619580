// HTTP handlers for note endpoints

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use validator::Validate;

use crate::auth::Identity;
use crate::error::ApiError;
use crate::notes::models::{CreateNoteRequest, Note};
use crate::AppState;

/// List the caller's notes
/// GET /api/v1/notes
#[utoipa::path(
    get,
    path = "/api/v1/notes",
    responses(
        (status = 200, description = "Notes owned by the caller", body = Vec<Note>),
        (status = 401, description = "Not logged in")
    ),
    security(("bearer" = [])),
    tag = "notes"
)]
pub async fn list_notes(
    State(state): State<AppState>,
    identity: Identity,
) -> Result<Json<Vec<Note>>, ApiError> {
    tracing::debug!("Fetching notes for user {}", identity.id);

    let notes = state.notes.list_for_user(identity.id).await?;

    tracing::debug!("Retrieved {} notes", notes.len());
    Ok(Json(notes))
}

/// Create a note owned by the caller
/// POST /api/v1/notes
#[utoipa::path(
    post,
    path = "/api/v1/notes",
    request_body = CreateNoteRequest,
    responses(
        (status = 200, description = "Note created", body = Note),
        (status = 401, description = "Not logged in"),
        (status = 422, description = "Invalid note")
    ),
    security(("bearer" = [])),
    tag = "notes"
)]
pub async fn create_note(
    State(state): State<AppState>,
    identity: Identity,
    payload: Result<Json<CreateNoteRequest>, JsonRejection>,
) -> Result<Json<Note>, ApiError> {
    let Json(request) = payload?;
    request.validate()?;

    let note = state
        .notes
        .insert(identity.id, &request.title, &request.note)
        .await?;

    tracing::info!("Created note {} for user {}", note.id, identity.id);
    Ok(Json(note))
}

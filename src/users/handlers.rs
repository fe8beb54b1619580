// HTTP handlers for admin user management

use axum::{
    extract::{rejection::JsonRejection, OriginalUri, Path, State},
    Json,
};
use validator::Validate;

use crate::auth::models::{UserChanges, UserResponse};
use crate::error::ApiError;
use crate::users::models::UpdateUserRequest;
use crate::AppState;

/// List every user without password hashes
/// GET /api/v1/users
#[utoipa::path(
    get,
    path = "/api/v1/users",
    responses(
        (status = 200, description = "All users", body = Vec<UserResponse>),
        (status = 401, description = "Not logged in"),
        (status = 403, description = "Caller is not an admin")
    ),
    security(("bearer" = [])),
    tag = "users"
)]
pub async fn list_users(State(state): State<AppState>) -> Result<Json<Vec<UserResponse>>, ApiError> {
    tracing::debug!("Listing users");

    let users = state.users.list_all().await?;
    Ok(Json(users))
}

/// Edit a user's username, password, role or active flag
/// PATCH /api/v1/users/:id
#[utoipa::path(
    patch,
    path = "/api/v1/users/{id}",
    params(
        ("id" = i32, Path, description = "User ID")
    ),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "User updated", body = UserResponse),
        (status = 401, description = "Not logged in"),
        (status = 403, description = "Caller is not an admin"),
        (status = 404, description = "User not found"),
        (status = 409, description = "Username is taken"),
        (status = 422, description = "Invalid update")
    ),
    security(("bearer" = [])),
    tag = "users"
)]
pub async fn update_user(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    Path(id): Path<String>,
    payload: Result<Json<UpdateUserRequest>, JsonRejection>,
) -> Result<Json<UserResponse>, ApiError> {
    let Json(request) = payload?;
    request.validate()?;

    let not_found = || ApiError::not_found(&uri);

    // Ids that cannot exist are treated like unknown ones
    let id: i32 = id.parse().map_err(|_| not_found())?;
    if state.users.find_by_id(id).await?.is_none() {
        return Err(not_found());
    }

    let password_hash = match request.password.as_deref() {
        Some(password) => Some(state.auth.hash_password(password).await?),
        None => None,
    };
    let changes = UserChanges {
        username: request.username,
        password_hash,
        role: request.roles,
        active: request.active,
    };

    let updated = state
        .users
        .update_by_id(id, changes)
        .await?
        .ok_or_else(not_found)?;

    tracing::info!("Updated user {}", updated.id);
    Ok(Json(updated))
}

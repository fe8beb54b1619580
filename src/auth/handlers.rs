// HTTP handlers for authentication endpoints

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use validator::Validate;

use crate::auth::models::{BannerResponse, CredentialsRequest, TokenResponse};
use crate::error::ApiError;
use crate::AppState;

/// Auth index banner
/// GET /auth
#[utoipa::path(
    get,
    path = "/auth",
    responses(
        (status = 200, description = "Auth service is up", body = BannerResponse)
    ),
    tag = "auth"
)]
pub async fn auth_index() -> Json<BannerResponse> {
    Json(BannerResponse {
        message: "🔒".to_string(),
    })
}

/// Register a new user and log them in
/// POST /auth/signup
#[utoipa::path(
    post,
    path = "/auth/signup",
    request_body = CredentialsRequest,
    responses(
        (status = 200, description = "User created, token issued", body = TokenResponse),
        (status = 409, description = "Username is taken"),
        (status = 422, description = "Invalid username or password")
    ),
    tag = "auth"
)]
pub async fn signup_handler(
    State(state): State<AppState>,
    payload: Result<Json<serde_json::Value>, JsonRejection>,
) -> Result<Json<TokenResponse>, ApiError> {
    let Json(body) = payload?;

    // A taken username answers 409 whatever the rest of the body looks like
    if let Some(username) = body.get("username").and_then(|value| value.as_str()) {
        tracing::debug!("Signup attempt for username: {}", username.trim());
        state.auth.ensure_username_free(username.trim()).await?;
    }

    let request: CredentialsRequest =
        serde_json::from_value(body).map_err(|e| ApiError::InvalidBody(e.to_string()))?;
    request.validate()?;

    let token = state.auth.signup(&request).await?;
    Ok(Json(TokenResponse { token }))
}

/// Log a user in
/// POST /auth/login
///
/// Every failure, including a malformed body, answers with the same generic error.
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = CredentialsRequest,
    responses(
        (status = 200, description = "Credentials accepted, token issued", body = TokenResponse),
        (status = 422, description = "Unable to login")
    ),
    tag = "auth"
)]
pub async fn login_handler(
    State(state): State<AppState>,
    payload: Result<Json<CredentialsRequest>, JsonRejection>,
) -> Result<Json<TokenResponse>, ApiError> {
    let request = match payload {
        Ok(Json(request)) if request.validate().is_ok() => request,
        _ => return Err(ApiError::AuthenticationFailed),
    };

    let token = state.auth.login(&request).await?;
    Ok(Json(TokenResponse { token }))
}

// Error handling module for the Ledger API
// Provides centralized error types, HTTP response conversion and the error responder

use axum::{
    body::Body,
    extract::{rejection::JsonRejection, Request, State},
    http::{header, StatusCode, Uri},
    middleware::Next,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use tracing::{debug, error, warn};

use crate::AppState;

/// Generic message for every login failure
pub const LOGIN_FAILED_MESSAGE: &str = "Unable to login";

/// Main error type for the API
/// All handlers and guards return Result<T, ApiError>
///
/// Each variant maps to a specific HTTP status code.
#[derive(Debug)]
pub enum ApiError {
    /// Field-level validation errors
    /// Maps to HTTP 422 Unprocessable Entity
    ValidationError(validator::ValidationErrors),

    /// Request body could not be read as the expected JSON shape
    /// Maps to HTTP 422 Unprocessable Entity
    InvalidBody(String),

    /// Login failure of any kind, deliberately without detail
    /// Maps to HTTP 422 Unprocessable Entity
    AuthenticationFailed,

    /// Duplicate resource conflict
    /// Maps to HTTP 409 Conflict
    Conflict { message: String },

    /// No identity attached to the request
    /// Maps to HTTP 401 Unauthorized
    Unauthorized(String),

    /// Identity lacks the required role
    /// Maps to HTTP 403 Forbidden
    Forbidden(String),

    /// Unmatched route or missing target record, carries the requested url
    /// Maps to HTTP 404 Not Found
    NotFound { url: String },

    /// Storage failures, details are never sent to clients
    /// Maps to HTTP 500 Internal Server Error
    DatabaseError(String),

    /// Internal failures (hashing, token signing)
    /// Maps to HTTP 500 Internal Server Error
    InternalError(String),
}

/// JSON body of every error response
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub message: String,

    /// Field-level validation errors
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,

    /// Error trace, only present when stack exposure is enabled
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
}

/// Attached to error responses so the error responder can rebuild the body
#[derive(Debug, Clone)]
pub struct ErrorReport {
    pub body: ErrorResponse,
    pub stack: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = self.to_error_response();
        let report = ErrorReport {
            body: body.clone(),
            stack: format!("{:#?}", self),
        };

        let mut response = (status, Json(body)).into_response();
        response.extensions_mut().insert(report);
        response
    }
}

impl ApiError {
    /// Convert ApiError to HTTP status code and ErrorResponse
    ///
    /// Expected client errors are logged at debug, security-relevant ones at warn,
    /// and server failures at error. 500 responses carry a generic message only.
    fn to_error_response(&self) -> (StatusCode, ErrorResponse) {
        let (message, details) = match self {
            ApiError::ValidationError(errors) => {
                debug!("Validation error: {:?}", errors);
                (
                    errors.to_string(),
                    Some(serde_json::to_value(errors).unwrap_or(serde_json::json!({}))),
                )
            }
            ApiError::InvalidBody(reason) => {
                debug!("Invalid request body: {}", reason);
                (reason.clone(), None)
            }
            ApiError::AuthenticationFailed => {
                debug!("Login attempt failed");
                (LOGIN_FAILED_MESSAGE.to_string(), None)
            }
            ApiError::Conflict { message } => {
                warn!("Conflict error: {}", message);
                (message.clone(), None)
            }
            ApiError::Unauthorized(message) => {
                warn!("Unauthorized access attempt: {}", message);
                (message.clone(), None)
            }
            ApiError::Forbidden(message) => {
                warn!("Forbidden access attempt: {}", message);
                (message.clone(), None)
            }
            ApiError::NotFound { url } => {
                debug!("Not found: {}", url);
                (format!("Not Found - {}", url), None)
            }
            ApiError::DatabaseError(db_error) => {
                error!("Database error: {}", db_error);
                ("A database error occurred".to_string(), None)
            }
            ApiError::InternalError(internal_msg) => {
                error!("Internal error: {}", internal_msg);
                ("An internal server error occurred".to_string(), None)
            }
        };

        (
            self.status_code(),
            ErrorResponse {
                message,
                details,
                stack: None,
            },
        )
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::ValidationError(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::InvalidBody(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::AuthenticationFailed => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Conflict { .. } => StatusCode::CONFLICT,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::DatabaseError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Not found for a request URI, reported as path and query only
    pub fn not_found(uri: &Uri) -> Self {
        let url = uri
            .path_and_query()
            .map(|path| path.as_str())
            .unwrap_or_else(|| uri.path());
        ApiError::NotFound {
            url: url.to_string(),
        }
    }

    /// Conflict raised when a username is already registered
    pub fn username_taken() -> Self {
        ApiError::Conflict {
            message: "Username is taken".to_string(),
        }
    }
}

/// Errors reported by the storage backends
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("unique constraint violated on {0}")]
    UniqueViolation(&'static str),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl From<StoreError> for ApiError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::UniqueViolation("username") => ApiError::username_taken(),
            StoreError::UniqueViolation(field) => ApiError::Conflict {
                message: format!("{} already exists", field),
            },
            StoreError::Database(db_error) => ApiError::DatabaseError(db_error.to_string()),
        }
    }
}

/// Convert validator errors to ApiError
impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        ApiError::ValidationError(errors)
    }
}

/// Convert JSON extraction failures to ApiError
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::InvalidBody(rejection.body_text())
    }
}

/// Process-wide error responder
///
/// Every error response passes through here. With stack exposure enabled the
/// body is rebuilt to include the error trace; otherwise it is left untouched.
pub async fn error_responder(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let response = next.run(request).await;

    if !state.config.expose_error_stack {
        return response;
    }
    let Some(report) = response.extensions().get::<ErrorReport>().cloned() else {
        return response;
    };

    let body = ErrorResponse {
        stack: Some(report.stack),
        ..report.body
    };
    let bytes = match serde_json::to_vec(&body) {
        Ok(bytes) => bytes,
        Err(e) => {
            error!("Failed to serialize error response: {}", e);
            return response;
        }
    };

    let (mut parts, _) = response.into_parts();
    parts.headers.remove(header::CONTENT_LENGTH);
    Response::from_parts(parts, Body::from(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(ApiError::AuthenticationFailed.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(
            ApiError::InvalidBody("bad".to_string()).status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(ApiError::username_taken().status_code(), StatusCode::CONFLICT);
        assert_eq!(ApiError::Unauthorized("x".to_string()).status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::Forbidden("x".to_string()).status_code(), StatusCode::FORBIDDEN);
        assert_eq!(
            ApiError::NotFound { url: "/x".to_string() }.status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::DatabaseError("boom".to_string()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_internal_details_are_hidden() {
        let (_, body) = ApiError::DatabaseError("relation users does not exist".to_string())
            .to_error_response();
        assert_eq!(body.message, "A database error occurred");
        assert!(body.stack.is_none());
    }

    #[test]
    fn test_not_found_message_includes_url() {
        let (_, body) = ApiError::NotFound { url: "/nope?x=1".to_string() }.to_error_response();
        assert_eq!(body.message, "Not Found - /nope?x=1");
    }

    #[test]
    fn test_not_found_drops_scheme_and_host() {
        let uri: Uri = "http://localhost:5000/api/v1/nothing?x=1".parse().unwrap();
        match ApiError::not_found(&uri) {
            ApiError::NotFound { url } => assert_eq!(url, "/api/v1/nothing?x=1"),
            other => panic!("Expected NotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_unique_violation_maps_to_conflict() {
        let error: ApiError = StoreError::UniqueViolation("username").into();
        match error {
            ApiError::Conflict { message } => assert_eq!(message, "Username is taken"),
            other => panic!("Expected Conflict, got {:?}", other),
        }
    }

    #[test]
    fn test_response_carries_report() {
        let response = ApiError::Forbidden("admins only".to_string()).into_response();
        let report = response.extensions().get::<ErrorReport>().unwrap();
        assert_eq!(report.body.message, "admins only");
        assert!(report.stack.contains("Forbidden"));
    }
}

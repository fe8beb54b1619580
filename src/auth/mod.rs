// Authentication module
// Signup/login with JWT issuance, the identity middleware and the access guards

pub mod handlers;
pub mod middleware;
pub mod models;
pub mod password;
pub mod repository;
pub mod service;
pub mod token;

use axum::{
    routing::{get, post},
    Router,
};

use crate::AppState;

// Re-export commonly used types
pub use handlers::{auth_index, login_handler, signup_handler};
pub use middleware::{identify, is_admin, is_logged_in, require_admin, require_login, RequestContext};
pub use models::{CredentialsRequest, Identity, Role, TokenResponse, User, UserResponse};
pub use repository::{PgUserStore, UserStore};
pub use service::AuthService;

/// Routes mounted under /auth
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(auth_index))
        .route("/signup", post(signup_handler))
        .route("/login", post(login_handler))
}

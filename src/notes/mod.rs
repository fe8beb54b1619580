pub mod handlers;
pub mod models;
pub mod repository;

use axum::{middleware, routing::get, Router};

use crate::auth::require_login;
use crate::AppState;

pub use handlers::*;
pub use models::*;
pub use repository::*;

/// Routes mounted under /api/v1/notes, all behind the login guard
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_notes).post(create_note))
        .route_layer(middleware::from_fn(require_login))
}

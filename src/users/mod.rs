pub mod handlers;
pub mod models;

use axum::{
    middleware,
    routing::{get, patch},
    Router,
};

use crate::auth::{require_admin, require_login};
use crate::AppState;

pub use handlers::*;
pub use models::*;

/// Routes mounted under /api/v1/users
///
/// The login guard runs first, then the admin guard, so anonymous callers get
/// 401 and non-admins get 403 before the target user is looked up.
pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(list_users))
        .route("/:id", patch(update_user))
        .route_layer(middleware::from_fn_with_state(state, require_admin))
        .route_layer(middleware::from_fn(require_login))
}

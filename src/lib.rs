pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod expenses;
pub mod memory;
pub mod notes;
pub mod users;
pub mod validation;

use std::sync::Arc;

use axum::{
    extract::OriginalUri,
    http::HeaderValue,
    middleware,
    response::Json,
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi, ToSchema,
};

use auth::{
    password::{PasswordError, PasswordService},
    token::TokenService,
    AuthService, Identity, PgUserStore, RequestContext, UserStore,
};
use config::{AppConfig, ConfigError};
use error::ApiError;
use expenses::{ExpenseStore, PgExpenseStore};
use memory::MemoryStore;
use notes::{NoteStore, PgNoteStore};

/// OpenAPI documentation structure
#[derive(OpenApi)]
#[openapi(
    paths(
        auth::handlers::auth_index,
        auth::handlers::signup_handler,
        auth::handlers::login_handler,
        notes::handlers::list_notes,
        notes::handlers::create_note,
        expenses::handlers::list_expenses,
        expenses::handlers::create_expense,
        users::handlers::list_users,
        users::handlers::update_user,
    ),
    components(
        schemas(
            RootResponse,
            auth::models::BannerResponse,
            auth::models::CredentialsRequest,
            auth::models::TokenResponse,
            auth::models::Identity,
            auth::models::Role,
            auth::models::UserResponse,
            notes::models::Note,
            notes::models::CreateNoteRequest,
            expenses::models::Expense,
            expenses::models::CreateExpenseRequest,
            users::models::UpdateUserRequest,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "auth", description = "Signup and login"),
        (name = "notes", description = "Notes owned by the caller"),
        (name = "expenses", description = "Expenses owned by the caller"),
        (name = "users", description = "Admin user management")
    ),
    info(
        title = "Ledger API",
        version = "0.1.0",
        description = "Authenticated notes and expenses backend"
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Application state shared across handlers
///
/// Built once at startup and passed to every handler; there is no global state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub auth: Arc<AuthService>,
    pub users: Arc<dyn UserStore>,
    pub notes: Arc<dyn NoteStore>,
    pub expenses: Arc<dyn ExpenseStore>,
}

impl AppState {
    /// Assemble the state from configuration and store handles
    pub fn new(
        config: AppConfig,
        users: Arc<dyn UserStore>,
        notes: Arc<dyn NoteStore>,
        expenses: Arc<dyn ExpenseStore>,
    ) -> Result<Self, PasswordError> {
        let passwords = PasswordService::new(config.password)?;
        let tokens = TokenService::new(&config.token_secret);
        let auth = AuthService::new(users.clone(), passwords, tokens);

        Ok(Self {
            config: Arc::new(config),
            auth: Arc::new(auth),
            users,
            notes,
            expenses,
        })
    }

    /// State backed by a fresh in-memory store
    pub fn in_memory(config: AppConfig) -> Result<Self, PasswordError> {
        let store = Arc::new(MemoryStore::new());
        Self::new(config, store.clone(), store.clone(), store)
    }

    /// State backed by Postgres
    pub fn postgres(config: AppConfig, pool: db::DbPool) -> Result<Self, PasswordError> {
        Self::new(
            config,
            Arc::new(PgUserStore::new(pool.clone())),
            Arc::new(PgNoteStore::new(pool.clone())),
            Arc::new(PgExpenseStore::new(pool)),
        )
    }
}

/// Body of the root banner
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RootResponse {
    pub message: String,
    /// Identity attached to this request, if any
    pub user: Option<Identity>,
}

/// Handler for GET /
async fn root(context: RequestContext) -> Json<RootResponse> {
    Json(RootResponse {
        message: "🦄🌈✨Hello World! 🌈✨🦄".to_string(),
        user: context.identity,
    })
}

/// Handler for GET /api-docs/openapi.json
async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

/// Fallback for unmatched routes
async fn not_found(OriginalUri(uri): OriginalUri) -> ApiError {
    ApiError::not_found(&uri)
}

fn cors_layer(origin: &str) -> CorsLayer {
    let allow_origin = if origin == "*" {
        AllowOrigin::any()
    } else {
        match origin.parse::<HeaderValue>() {
            Ok(value) => AllowOrigin::exact(value),
            Err(_) => {
                tracing::warn!("Invalid CORS origin {:?}, allowing any origin", origin);
                AllowOrigin::any()
            }
        }
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Creates and configures the application router
///
/// Request order: trace → CORS → error responder → identity middleware → routes.
pub fn create_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.cors_origin);

    Router::new()
        .route("/", get(root))
        .route("/api-docs/openapi.json", get(openapi_json))
        .nest("/auth", auth::routes())
        .nest("/api/v1/notes", notes::routes())
        .nest("/api/v1/expenses", expenses::routes())
        .nest("/api/v1/users", users::routes(state.clone()))
        .fallback(not_found)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors)
                .layer(middleware::from_fn_with_state(state.clone(), error::error_responder))
                .layer(middleware::from_fn_with_state(state.clone(), auth::identify)),
        )
        .with_state(state)
}

/// Failures that abort startup
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("database connection failed: {0}")]
    Database(#[from] sqlx::Error),

    #[error("database migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("password hasher setup failed: {0}")]
    Password(#[from] PasswordError),

    #[error("admin seeding failed: {0:?}")]
    Seed(ApiError),

    #[error("server error: {0}")]
    Io(#[from] std::io::Error),
}

/// Build the state for a configuration: Postgres when a database URL is set,
/// otherwise the in-memory store. Seeds the admin account when configured.
pub async fn build_state(config: AppConfig) -> Result<AppState, StartupError> {
    let state = match config.database_url.clone() {
        Some(database_url) => {
            tracing::info!("Connecting to database...");
            let pool = db::create_pool(&database_url).await?;
            db::run_migrations(&pool).await?;
            AppState::postgres(config, pool)?
        }
        None => {
            tracing::warn!("DATABASE_URL not set, using the in-memory store; data is lost on exit");
            AppState::in_memory(config)?
        }
    };

    if let Some(password) = state.config.default_admin_password.clone() {
        state
            .auth
            .ensure_admin(&password)
            .await
            .map_err(StartupError::Seed)?;
    }

    Ok(state)
}

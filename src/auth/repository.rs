// Credential store: user persistence

use async_trait::async_trait;
use sqlx::PgPool;

use crate::auth::models::{NewUser, Role, User, UserChanges, UserResponse};
use crate::error::StoreError;

/// Storage operations on user records
///
/// Username uniqueness is enforced by the store itself: `insert` and
/// `update_by_id` fail with `StoreError::UniqueViolation("username")`.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError>;

    async fn find_by_id(&self, id: i32) -> Result<Option<User>, StoreError>;

    /// Any user holding the admin role
    async fn find_admin(&self) -> Result<Option<User>, StoreError>;

    async fn insert(&self, user: NewUser) -> Result<User, StoreError>;

    /// Apply a partial update; `Ok(None)` when no user has this id
    async fn update_by_id(
        &self,
        id: i32,
        changes: UserChanges,
    ) -> Result<Option<UserResponse>, StoreError>;

    /// Every user, without password hashes
    async fn list_all(&self) -> Result<Vec<UserResponse>, StoreError>;
}

/// Postgres-backed user store
#[derive(Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    /// Create a new PgUserStore
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Map a unique constraint violation on users to `StoreError::UniqueViolation`
fn map_username_violation(e: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_unique_violation() {
            return StoreError::UniqueViolation("username");
        }
    }
    StoreError::Database(e)
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, password_hash, role, active, created_at FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, password_hash, role, active, created_at FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_admin(&self) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, password_hash, role, active, created_at
            FROM users
            WHERE role = $1
            ORDER BY id
            LIMIT 1
            "#,
        )
        .bind(Role::Admin)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn insert(&self, user: NewUser) -> Result<User, StoreError> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, password_hash, role, active)
            VALUES ($1, $2, $3, $4)
            RETURNING id, username, password_hash, role, active, created_at
            "#,
        )
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(user.role)
        .bind(user.active)
        .fetch_one(&self.pool)
        .await
        .map_err(map_username_violation)
    }

    async fn update_by_id(
        &self,
        id: i32,
        changes: UserChanges,
    ) -> Result<Option<UserResponse>, StoreError> {
        sqlx::query_as::<_, UserResponse>(
            r#"
            UPDATE users
            SET username = COALESCE($1, username),
                password_hash = COALESCE($2, password_hash),
                role = COALESCE($3, role),
                active = COALESCE($4, active)
            WHERE id = $5
            RETURNING id, username, role, active, created_at
            "#,
        )
        .bind(changes.username)
        .bind(changes.password_hash)
        .bind(changes.role)
        .bind(changes.active)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_username_violation)
    }

    async fn list_all(&self) -> Result<Vec<UserResponse>, StoreError> {
        let users = sqlx::query_as::<_, UserResponse>(
            "SELECT id, username, role, active, created_at FROM users ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }
}

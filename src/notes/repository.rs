use async_trait::async_trait;
use sqlx::PgPool;

use crate::error::StoreError;
use crate::notes::models::Note;

/// Storage operations on notes, always scoped to an owner
#[async_trait]
pub trait NoteStore: Send + Sync {
    /// Notes whose owner is `user_id`
    async fn list_for_user(&self, user_id: i32) -> Result<Vec<Note>, StoreError>;

    async fn insert(&self, user_id: i32, title: &str, note: &str) -> Result<Note, StoreError>;
}

/// Postgres-backed note store
#[derive(Clone)]
pub struct PgNoteStore {
    pool: PgPool,
}

impl PgNoteStore {
    /// Create a new PgNoteStore
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NoteStore for PgNoteStore {
    async fn list_for_user(&self, user_id: i32) -> Result<Vec<Note>, StoreError> {
        let notes = sqlx::query_as::<_, Note>(
            r#"
            SELECT id, user_id, title, note, created_at
            FROM notes
            WHERE user_id = $1
            ORDER BY id
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(notes)
    }

    async fn insert(&self, user_id: i32, title: &str, note: &str) -> Result<Note, StoreError> {
        let note = sqlx::query_as::<_, Note>(
            r#"
            INSERT INTO notes (user_id, title, note)
            VALUES ($1, $2, $3)
            RETURNING id, user_id, title, note, created_at
            "#,
        )
        .bind(user_id)
        .bind(title)
        .bind(note)
        .fetch_one(&self.pool)
        .await?;

        Ok(note)
    }
}

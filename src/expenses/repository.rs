use async_trait::async_trait;
use sqlx::PgPool;

use crate::error::StoreError;
use crate::expenses::models::{Expense, NewExpense};

/// Storage operations on expenses, always scoped to an owner
#[async_trait]
pub trait ExpenseStore: Send + Sync {
    /// Expenses whose owner is `user_id`
    async fn list_for_user(&self, user_id: i32) -> Result<Vec<Expense>, StoreError>;

    async fn insert(&self, expense: NewExpense) -> Result<Expense, StoreError>;
}

/// Postgres-backed expense store
#[derive(Clone)]
pub struct PgExpenseStore {
    pool: PgPool,
}

impl PgExpenseStore {
    /// Create a new PgExpenseStore
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ExpenseStore for PgExpenseStore {
    async fn list_for_user(&self, user_id: i32) -> Result<Vec<Expense>, StoreError> {
        let expenses = sqlx::query_as::<_, Expense>(
            r#"
            SELECT id, user_id, category, amount, date, note, person, account, created_at
            FROM expenses
            WHERE user_id = $1
            ORDER BY date, id
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(expenses)
    }

    async fn insert(&self, expense: NewExpense) -> Result<Expense, StoreError> {
        let expense = sqlx::query_as::<_, Expense>(
            r#"
            INSERT INTO expenses (user_id, category, amount, date, note, person, account)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, user_id, category, amount, date, note, person, account, created_at
            "#,
        )
        .bind(expense.user_id)
        .bind(expense.category)
        .bind(expense.amount)
        .bind(expense.date)
        .bind(expense.note)
        .bind(expense.person)
        .bind(expense.account)
        .fetch_one(&self.pool)
        .await?;

        Ok(expense)
    }
}

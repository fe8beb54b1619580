// HTTP handlers for expense endpoints

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use validator::Validate;

use crate::auth::Identity;
use crate::error::ApiError;
use crate::expenses::models::{CreateExpenseRequest, Expense, NewExpense};
use crate::AppState;

/// List the caller's expenses
/// GET /api/v1/expenses
#[utoipa::path(
    get,
    path = "/api/v1/expenses",
    responses(
        (status = 200, description = "Expenses owned by the caller", body = Vec<Expense>),
        (status = 401, description = "Not logged in")
    ),
    security(("bearer" = [])),
    tag = "expenses"
)]
pub async fn list_expenses(
    State(state): State<AppState>,
    identity: Identity,
) -> Result<Json<Vec<Expense>>, ApiError> {
    tracing::debug!("Fetching expenses for user {}", identity.id);

    let expenses = state.expenses.list_for_user(identity.id).await?;
    Ok(Json(expenses))
}

/// Record an expense owned by the caller
/// POST /api/v1/expenses
#[utoipa::path(
    post,
    path = "/api/v1/expenses",
    request_body = CreateExpenseRequest,
    responses(
        (status = 200, description = "Expense created", body = Expense),
        (status = 401, description = "Not logged in"),
        (status = 422, description = "Invalid expense")
    ),
    security(("bearer" = [])),
    tag = "expenses"
)]
pub async fn create_expense(
    State(state): State<AppState>,
    identity: Identity,
    payload: Result<Json<CreateExpenseRequest>, JsonRejection>,
) -> Result<Json<Expense>, ApiError> {
    let Json(request) = payload?;
    request.validate()?;

    let expense = state
        .expenses
        .insert(NewExpense::owned_by(identity.id, request))
        .await?;

    tracing::info!("Created expense {} for user {}", expense.id, identity.id);
    Ok(Json(expense))
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use crate::validation::{flexible_date, trimmed, trimmed_opt, validate_finite};

/// Expense owned by a single user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Expense {
    #[schema(example = 1)]
    pub id: i32,
    #[schema(example = 1)]
    pub user_id: i32,
    #[schema(example = "Food")]
    pub category: String,
    #[schema(example = 12.5)]
    pub amount: f64,
    pub date: DateTime<Utc>,
    pub note: Option<String>,
    pub person: Option<String>,
    pub account: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Request DTO for creating an expense
///
/// Optional strings, when present, must be non-empty after trimming.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateExpenseRequest {
    #[serde(deserialize_with = "trimmed")]
    #[validate(length(min = 1, max = 100, message = "Category is required and must not exceed 100 characters"))]
    pub category: String,
    #[validate(custom = "validate_finite")]
    pub amount: f64,
    /// RFC 3339 timestamp, `YYYY-MM-DD`, or milliseconds since the epoch
    #[serde(deserialize_with = "flexible_date")]
    #[schema(value_type = String, example = "2024-03-05")]
    pub date: DateTime<Utc>,
    #[serde(default, deserialize_with = "trimmed_opt")]
    #[validate(length(min = 1, max = 200, message = "Note must be between 1 and 200 characters"))]
    pub note: Option<String>,
    #[serde(default, deserialize_with = "trimmed_opt")]
    #[validate(length(min = 1, message = "Person must not be empty"))]
    pub person: Option<String>,
    #[serde(default, deserialize_with = "trimmed_opt")]
    #[validate(length(min = 1, message = "Account must not be empty"))]
    pub account: Option<String>,
}

/// Values for an expense about to be inserted
#[derive(Debug, Clone)]
pub struct NewExpense {
    pub user_id: i32,
    pub category: String,
    pub amount: f64,
    pub date: DateTime<Utc>,
    pub note: Option<String>,
    pub person: Option<String>,
    pub account: Option<String>,
}

impl NewExpense {
    /// Bind a validated request to its owner
    pub fn owned_by(user_id: i32, request: CreateExpenseRequest) -> Self {
        Self {
            user_id,
            category: request.category,
            amount: request.amount,
            date: request.date,
            note: request.note,
            person: request.person,
            account: request.account,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(body: serde_json::Value) -> Result<CreateExpenseRequest, serde_json::Error> {
        serde_json::from_value(body)
    }

    #[test]
    fn test_minimal_expense_is_valid() {
        let request = parse(serde_json::json!({
            "category": " Rent ",
            "amount": 950,
            "date": "2024-02-01"
        }))
        .unwrap();

        assert_eq!(request.category, "Rent");
        assert_eq!(request.amount, 950.0);
        assert!(request.note.is_none());
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_expense_field_limits() {
        let long_note = parse(serde_json::json!({
            "category": "Food",
            "amount": 1.5,
            "date": "2024-02-01",
            "note": "n".repeat(201)
        }))
        .unwrap();
        assert!(long_note.validate().is_err());

        let empty_person = parse(serde_json::json!({
            "category": "Food",
            "amount": 1.5,
            "date": "2024-02-01",
            "person": "  "
        }))
        .unwrap();
        assert!(empty_person.validate().is_err());
    }

    #[test]
    fn test_required_fields() {
        assert!(parse(serde_json::json!({ "category": "Food", "date": "2024-02-01" })).is_err());
        assert!(parse(serde_json::json!({ "category": "Food", "amount": 3 })).is_err());
        assert!(parse(serde_json::json!({ "category": "Food", "amount": "three", "date": "2024-02-01" })).is_err());
    }

    #[test]
    fn test_owner_comes_from_caller() {
        let request = parse(serde_json::json!({
            "category": "Food",
            "amount": 4,
            "date": 1700000000000i64,
            "user_id": 999
        }))
        .unwrap();

        let expense = NewExpense::owned_by(7, request);
        assert_eq!(expense.user_id, 7);
    }
}

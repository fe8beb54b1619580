use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use crate::validation::trimmed;

/// Note owned by a single user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Note {
    #[schema(example = 1)]
    pub id: i32,
    #[schema(example = 1)]
    pub user_id: i32,
    #[schema(example = "Groceries")]
    pub title: String,
    #[schema(example = "Milk, eggs, bread")]
    pub note: String,
    pub created_at: DateTime<Utc>,
}

/// Request DTO for creating a note
///
/// Unknown fields (including any client-sent `user_id`) are ignored.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateNoteRequest {
    #[serde(deserialize_with = "trimmed")]
    #[validate(length(min = 1, max = 100, message = "Title is required and must not exceed 100 characters"))]
    pub title: String,
    #[serde(deserialize_with = "trimmed")]
    #[validate(length(min = 1, message = "Note is required"))]
    pub note: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_note_rules() {
        let ok: CreateNoteRequest =
            serde_json::from_str(r#"{"title":" Todo ","note":"call mum","user_id":99}"#).unwrap();
        assert_eq!(ok.title, "Todo");
        assert!(ok.validate().is_ok());

        let blank: CreateNoteRequest =
            serde_json::from_str(r#"{"title":"   ","note":"x"}"#).unwrap();
        assert!(blank.validate().is_err());

        let long_title = serde_json::json!({ "title": "t".repeat(101), "note": "x" });
        let long: CreateNoteRequest = serde_json::from_value(long_title).unwrap();
        assert!(long.validate().is_err());

        assert!(serde_json::from_str::<CreateNoteRequest>(r#"{"title":"only"}"#).is_err());
    }
}

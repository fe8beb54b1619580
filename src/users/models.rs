use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

use crate::auth::Role;
use crate::validation::{trimmed_opt, validate_password, validate_username};

/// Request DTO for the admin user patch; every field is optional
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct UpdateUserRequest {
    #[serde(default, deserialize_with = "trimmed_opt")]
    #[validate(
        length(min = 2, max = 30, message = "Username must be between 2 and 30 characters"),
        custom = "validate_username"
    )]
    pub username: Option<String>,
    #[serde(default)]
    #[validate(custom = "validate_password")]
    pub password: Option<String>,
    /// New role, sent as `roles` (or `role`)
    #[serde(default, alias = "role")]
    pub roles: Option<Role>,
    #[serde(default)]
    pub active: Option<bool>,
}

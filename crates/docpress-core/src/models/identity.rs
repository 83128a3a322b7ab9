use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    User,
}

impl UserRole {
    /// Unknown role strings resolve to the unprivileged role.
    pub fn parse_lenient(s: &str) -> UserRole {
        if s.trim().eq_ignore_ascii_case("admin") {
            UserRole::Admin
        } else {
            UserRole::User
        }
    }
}

/// Caller identity, already verified by the upstream gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserContext {
    pub user_id: String,
    pub user_name: String,
    pub role: UserRole,
    pub full_name: Option<String>,
}

impl UserContext {
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }

    /// Key under which this user's upload is staged.
    pub fn staging_key(&self) -> &str {
        if self.user_id.is_empty() {
            &self.user_name
        } else {
            &self.user_id
        }
    }
}

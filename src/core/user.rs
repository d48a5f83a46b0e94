use super::ids::UserId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A user account held by the host store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub login: String,
    pub email: String,
    pub display_name: String,
    /// PHC-format argon2 hash
    pub password_hash: String,
    pub roles: Vec<String>,
    pub registered_at: DateTime<Utc>,
}

impl User {
    #[must_use]
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }

    /// Login names are matched case-insensitively, emails exactly after lowercasing
    #[must_use]
    pub fn matches_login(&self, login_or_email: &str) -> bool {
        let needle = login_or_email.trim().to_lowercase();
        self.login.to_lowercase() == needle || self.email.to_lowercase() == needle
    }
}

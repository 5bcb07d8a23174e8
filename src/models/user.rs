//! User model
//!
//! Users register themselves through the web site. Superusers are created
//! from the command line and are the only accounts allowed to publish.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Maximum length of `username`, `first_name` and `last_name`
pub const NAME_MAX_LENGTH: usize = 150;

/// Maximum length of `email`
pub const EMAIL_MAX_LENGTH: usize = 254;

/// Registered user account
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    /// Unique identifier
    pub id: i64,
    /// Login name (unique)
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    /// Email address, empty when not given
    pub email: String,
    /// Password hash (argon2 PHC string)
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// May create articles
    pub is_superuser: bool,
    /// Inactive users cannot log in
    pub is_active: bool,
    /// Registration timestamp
    pub date_joined: DateTime<Utc>,
}

impl User {
    /// Create a new active, non-privileged user.
    ///
    /// The password must already be hashed, see `services::password::hash_password`.
    pub fn new(
        username: String,
        first_name: String,
        last_name: String,
        email: String,
        password_hash: String,
    ) -> Self {
        Self {
            id: 0, // Will be set by the database
            username,
            first_name,
            last_name,
            email,
            password_hash,
            is_superuser: false,
            is_active: true,
            date_joined: Utc::now(),
        }
    }

    /// "First Last", trimmed; falls back to the username when both are empty
    pub fn full_name(&self) -> String {
        let full = format!("{} {}", self.first_name, self.last_name);
        let full = full.trim();
        if full.is_empty() {
            self.username.clone()
        } else {
            full.to_string()
        }
    }

    /// Check whether this user owns the given article owner id
    pub fn owns(&self, owner_id: i64) -> bool {
        self.id == owner_id
    }
}

/// Input for creating a user
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateUserInput {
    pub username: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    /// Plain text password, hashed by the service
    pub password: String,
    #[serde(default)]
    pub is_superuser: bool,
}

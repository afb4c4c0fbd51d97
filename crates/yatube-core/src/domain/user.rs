use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::FormErrors;

pub const USERNAME_MAX_LEN: usize = 150;
pub const PASSWORD_MIN_LEN: usize = 8;

/// User entity - an account that can author posts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub date_joined: DateTime<Utc>,
}

impl User {
    /// Create a new, unsaved user.
    pub fn new(username: String, password_hash: String) -> Self {
        Self {
            id: 0,
            username,
            password_hash,
            date_joined: Utc::now(),
        }
    }

    /// Check signup input. Usernames allow letters, digits and `@ . + - _`.
    pub fn validate_signup(username: &str, password: &str) -> Result<(), FormErrors> {
        let mut errors = FormErrors::default();

        if username.is_empty() {
            errors.add("username", "This field is required.");
        } else if username.chars().count() > USERNAME_MAX_LEN {
            errors.add(
                "username",
                format!("Ensure this value has at most {USERNAME_MAX_LEN} characters."),
            );
        } else if !username
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_'))
        {
            errors.add(
                "username",
                "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.",
            );
        }

        if password.chars().count() < PASSWORD_MIN_LEN {
            errors.add(
                "password",
                format!("Password must be at least {PASSWORD_MIN_LEN} characters."),
            );
        } else if password.eq_ignore_ascii_case(username) {
            errors.add("password", "The password is too similar to the username.");
        } else if password.chars().all(|c| c.is_ascii_digit()) {
            errors.add("password", "This password is entirely numeric.");
        }

        errors.into_result()
    }
}

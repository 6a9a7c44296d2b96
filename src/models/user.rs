use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

/// Longest accepted username, in characters
pub const MAX_USERNAME_LEN: usize = 100;

/// A registered reviewer
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
}

/// Payload for registering a reviewer
#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub username: String,
}

impl NewUser {
    /// Usernames are trimmed; empty or overlong names are rejected
    pub fn normalized_username(&self) -> AppResult<String> {
        let trimmed = self.username.trim();
        if trimmed.is_empty() {
            return Err(AppError::InvalidInput("username must not be empty".to_string()));
        }
        if trimmed.chars().count() > MAX_USERNAME_LEN {
            return Err(AppError::InvalidInput(format!(
                "username must be at most {} characters",
                MAX_USERNAME_LEN
            )));
        }
        Ok(trimmed.to_string())
    }
}

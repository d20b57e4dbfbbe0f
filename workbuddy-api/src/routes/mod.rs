/// API route handlers
///
/// Organized by resource:
///
/// - `health`: liveness and database connectivity
/// - `auth`: login, logout and the current session
/// - `users`: user listing, creation and deletion
/// - `projects`: projects, project selection and membership
/// - `invitations`: project invitations
/// - `tasks`: task CRUD within a project
/// - `comments`: task comments
/// - `chat`: chat message history and posting
/// - `ws`: WebSocket endpoint for chat rooms

pub mod auth;
pub mod chat;
pub mod comments;
pub mod health;
pub mod invitations;
pub mod projects;
pub mod tasks;
pub mod users;
pub mod ws;

use serde::{Deserialize, Deserializer};
use std::borrow::Cow;
use validator::ValidationError;

/// Deserializes a string with surrounding whitespace removed, so validation
/// sees the value that gets stored
pub(crate) fn trimmed<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    String::deserialize(deserializer).map(|value| value.trim().to_string())
}

/// Rejects empty and whitespace-only strings
pub(crate) fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut error = ValidationError::new("blank");
        error.message = Some(Cow::Borrowed("must not be blank"));
        return Err(error);
    }
    Ok(())
}

/// Treats absent, empty and whitespace-only values alike
pub(crate) fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

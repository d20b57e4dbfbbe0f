/// Authentication and authorization primitives
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing and verification
/// - [`token`]: random session and invitation tokens, SHA-256 token hashing
/// - [`authorization`]: the per-action role policy table
///
/// Session lookup itself lives in [`crate::models::session`]; the HTTP
/// middleware that uses it belongs to the API crate.

pub mod authorization;
pub mod password;
pub mod token;

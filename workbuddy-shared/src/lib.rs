//! # WorkBuddy Shared Library
//!
//! Data layer, auth primitives and the realtime hub used by the WorkBuddy
//! API server.
//!
//! ## Module Organization
//!
//! - `db`: connection pool, migrations and demo-data seeding
//! - `models`: one module per table with its CRUD operations
//! - `auth`: password hashing, session tokens and the role policy table
//! - `realtime`: chat room fan-out for WebSocket subscribers

pub mod auth;
pub mod db;
pub mod models;
pub mod realtime;

/// Current version of the WorkBuddy shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}

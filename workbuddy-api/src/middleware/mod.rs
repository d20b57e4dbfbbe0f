/// Middleware for the API server
///
/// - `session`: session cookie authentication and the request-scoped `SessionContext`
/// - `security`: security response headers

pub mod security;
pub mod session;

/// Session cookie authentication
///
/// [`session_auth_layer`] reads the session cookie, hashes the token, loads the
/// session with its user and selected project, and inserts a
/// [`SessionContext`] into the request extensions. Requests without a valid,
/// unexpired session are answered with 401 before reaching the handler.
///
/// # Example
///
/// ```no_run
/// use axum::Extension;
/// use workbuddy_api::middleware::session::SessionContext;
///
/// async fn handler(Extension(session): Extension<SessionContext>) -> String {
///     format!("Hello, {}", session.user.name)
/// }
/// ```

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};
use tracing::debug;
use workbuddy_shared::auth::authorization::{self, Action, AuthzError};
use workbuddy_shared::auth::token::{hash_token, is_well_formed_session_token};
use workbuddy_shared::models::project::ProjectRef;
use workbuddy_shared::models::session::{ActiveSession, Session};
use workbuddy_shared::models::user::{PublicUser, UserRole};

use crate::app::AppState;
use crate::config::SessionConfig;
use crate::error::ApiError;

/// Request-scoped view of the caller's session
#[derive(Debug, Clone)]
pub struct SessionContext {
    /// Key of the session row
    pub token_hash: String,

    pub user: PublicUser,

    /// Project chosen with select-project, if any
    pub current_project: Option<ProjectRef>,
}

impl From<ActiveSession> for SessionContext {
    fn from(session: ActiveSession) -> Self {
        Self {
            token_hash: session.token_hash,
            user: session.user,
            current_project: session.current_project,
        }
    }
}

impl SessionContext {
    pub fn user_id(&self) -> &str {
        &self.user.id
    }

    pub fn role(&self) -> UserRole {
        self.user.role
    }

    /// Checks the caller's role against the policy table
    pub fn authorize(&self, action: Action) -> Result<(), AuthzError> {
        authorization::require(self.role(), action)
    }
}

/// Rejects requests without a live session and attaches [`SessionContext`]
pub async fn session_auth_layer(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = read_cookie(req.headers(), &state.config.session.cookie_name)
        .ok_or_else(|| ApiError::Unauthorized("Not logged in".to_string()))?;

    if !is_well_formed_session_token(&token) {
        return Err(ApiError::Unauthorized("Invalid session".to_string()));
    }

    let session = Session::find_active(&state.db, &hash_token(&token))
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Session expired or invalid".to_string()))?;

    debug!(user_id = %session.user.id, "Session authenticated");
    req.extensions_mut().insert(SessionContext::from(session));

    Ok(next.run(req).await)
}

/// Value of cookie `name` from the `Cookie` headers
pub fn read_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim().to_string())
}

/// `Set-Cookie` value carrying a new session token
pub fn session_cookie(config: &SessionConfig, token: &str) -> Result<HeaderValue, ApiError> {
    let max_age = config.ttl_hours.saturating_mul(3600);
    build_cookie(config, token, max_age)
}

/// `Set-Cookie` value that makes the browser drop the session cookie
pub fn expired_session_cookie(config: &SessionConfig) -> Result<HeaderValue, ApiError> {
    build_cookie(config, "", 0)
}

fn build_cookie(config: &SessionConfig, value: &str, max_age: i64) -> Result<HeaderValue, ApiError> {
    let mut cookie = format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        config.cookie_name, value, max_age
    );
    if config.cookie_secure {
        cookie.push_str("; Secure");
    }

    HeaderValue::from_str(&cookie)
        .map_err(|e| ApiError::InternalError(format!("Invalid cookie header: {}", e)))
}

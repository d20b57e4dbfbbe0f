/// Authentication endpoints
///
/// - `POST /api/v1/login`: check credentials, start a session, set the cookie
/// - `POST /api/v1/logout`: end the session and clear the cookie
/// - `GET /api/v1/session`: who is logged in and which project is selected

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::ApiJson,
    middleware::session::{expired_session_cookie, read_cookie, session_cookie, SessionContext},
};
use axum::{
    extract::State,
    http::{header, HeaderMap},
    response::IntoResponse,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use validator::Validate;
use workbuddy_shared::{
    auth::{password, token},
    models::{
        project::ProjectRef,
        session::Session,
        user::{PublicUser, User},
    },
};

use super::{not_blank, trimmed};

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[serde(default, deserialize_with = "trimmed")]
    #[validate(custom(function = "not_blank", message = "Email is required"))]
    pub email: String,

    #[serde(default)]
    #[validate(custom(function = "not_blank", message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub success: bool,
    pub user: PublicUser,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LogoutResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionResponse {
    pub user: PublicUser,
    pub current_project: Option<ProjectRef>,
}

/// Login endpoint
///
/// # Endpoint
///
/// ```text
/// POST /api/v1/login
/// Content-Type: application/json
///
/// { "email": "owner@workbuddy.pro", "password": "password123" }
/// ```
///
/// # Response
///
/// ```json
/// {
///   "success": true,
///   "user": { "id": "owner01", "name": "Owner User", "email": "owner@workbuddy.pro", "role": "Owner" }
/// }
/// ```
///
/// The session token travels only in the `Set-Cookie` header.
///
/// # Errors
///
/// - `400 Bad Request`: email or password missing
/// - `401 Unauthorized`: unknown email or wrong password (same message for both)
pub async fn login(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> ApiResult<impl IntoResponse> {
    req.validate()?;

    let invalid = || ApiError::Unauthorized("Invalid email or password".to_string());

    let user = User::find_by_email(&state.db, &req.email)
        .await?
        .ok_or_else(invalid)?;

    if !password::verify_password(&req.password, &user.password_hash)? {
        debug!(user_id = %user.id, "Login rejected: wrong password");
        return Err(invalid());
    }

    let (session_token, token_hash) = token::generate_session_token();
    Session::create(&state.db, &token_hash, &user.id, state.config.session_ttl()).await?;

    info!(user_id = %user.id, role = %user.role, "User logged in");

    let cookie = session_cookie(&state.config.session, &session_token)?;
    Ok((
        [(header::SET_COOKIE, cookie)],
        Json(LoginResponse {
            success: true,
            user: PublicUser::from(&user),
        }),
    ))
}

/// Logout endpoint
///
/// Idempotent: answers 200 whether or not a session existed.
pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<impl IntoResponse> {
    if let Some(session_token) = read_cookie(&headers, &state.config.session.cookie_name) {
        let deleted = Session::delete(&state.db, &token::hash_token(&session_token)).await?;
        if deleted {
            info!("User logged out");
        }
    }

    let cookie = expired_session_cookie(&state.config.session)?;
    Ok((
        [(header::SET_COOKIE, cookie)],
        Json(LogoutResponse {
            success: true,
            message: "Logged out successfully.".to_string(),
        }),
    ))
}

pub async fn current_session(
    Extension(session): Extension<SessionContext>,
) -> Json<SessionResponse> {
    Json(SessionResponse {
        user: session.user,
        current_project: session.current_project,
    })
}

/// User endpoints
///
/// - `GET /api/v1/users`: everyone except the caller, by name
/// - `POST /api/v1/users`: create an account (Owner)
/// - `DELETE /api/v1/users/:user_id`: delete an account (Owner)

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::{ApiJson, ApiPath},
    middleware::session::SessionContext,
};
use axum::{
    extract::State,
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use validator::Validate;
use workbuddy_shared::{
    auth::{authorization::Action, password},
    models::user::{CreateUser, PublicUser, User, UserRole, UserSummary},
};

use super::{not_blank, trimmed};

#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[serde(default, deserialize_with = "trimmed")]
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[serde(default)]
    #[validate(
        custom(function = "not_blank", message = "Name is required"),
        length(max = 100, message = "Name must be at most 100 characters")
    )]
    pub name: String,

    #[serde(default)]
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,

    pub role: UserRole,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DeleteUserResponse {
    pub success: bool,
    pub message: String,
}

pub async fn list_users(
    State(state): State<AppState>,
    Extension(session): Extension<SessionContext>,
) -> ApiResult<Json<Vec<UserSummary>>> {
    session.authorize(Action::ListUsers)?;

    let users = User::list_except(&state.db, session.user_id()).await?;
    Ok(Json(users))
}

/// Creates a user account
///
/// # Errors
///
/// - `400 Bad Request`: invalid email, blank name, short password
/// - `403 Forbidden`: caller is not an Owner
/// - `409 Conflict`: email already registered (any letter case)
pub async fn create_user(
    State(state): State<AppState>,
    Extension(session): Extension<SessionContext>,
    ApiJson(req): ApiJson<CreateUserRequest>,
) -> ApiResult<(StatusCode, Json<PublicUser>)> {
    session.authorize(Action::CreateUser)?;
    req.validate()?;

    let email = req.email;
    if User::email_exists(&state.db, &email).await? {
        return Err(ApiError::Conflict("Email already exists".to_string()));
    }

    let password_hash = password::hash_password(&req.password)?;

    // A concurrent insert of the same email still surfaces as 409 via the
    // unique constraint
    let user = User::create(
        &state.db,
        CreateUser {
            id: None,
            email,
            name: req.name.trim().to_string(),
            password_hash,
            role: req.role,
        },
    )
    .await?;

    info!(user_id = %user.id, role = %user.role, created_by = %session.user_id(), "User created");

    Ok((StatusCode::CREATED, Json(PublicUser::from(&user))))
}

/// Deletes a user account
///
/// Tasks, comments and messages the user authored are kept with a NULL
/// author; memberships and sessions are removed.
///
/// # Errors
///
/// - `400 Bad Request`: deleting your own account
/// - `403 Forbidden`: caller is not an Owner
/// - `404 Not Found`: unknown user
/// - `409 Conflict`: the user still owns projects
pub async fn delete_user(
    State(state): State<AppState>,
    Extension(session): Extension<SessionContext>,
    ApiPath(user_id): ApiPath<String>,
) -> ApiResult<Json<DeleteUserResponse>> {
    session.authorize(Action::DeleteUser)?;

    if user_id == session.user_id() {
        return Err(ApiError::BadRequest(
            "Owners cannot delete their own account via the API".to_string(),
        ));
    }

    let user = User::find_by_id(&state.db, &user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    let mut tx = state.db.begin().await?;

    let owned = User::owned_project_count(&mut *tx, &user_id).await?;
    if owned > 0 {
        return Err(ApiError::Conflict(format!(
            "User '{}' still owns {} project(s)",
            user.name, owned
        )));
    }

    if !User::delete(&mut *tx, &user_id).await? {
        return Err(ApiError::NotFound("User not found".to_string()));
    }

    tx.commit().await?;

    info!(user_id = %user_id, deleted_by = %session.user_id(), "User deleted");

    Ok(Json(DeleteUserResponse {
        success: true,
        message: format!("User '{}' has been deleted successfully.", user.name),
    }))
}

/// Invitation endpoint
///
/// `POST /api/v1/projects/:project_id/invitations` (Owner)
///
/// Nothing is emailed: the response carries the registration link, and
/// handing it over is up to the Owner.

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
    auth::authorization::Action,
    models::{
        invitation::{invite_link, CreateInvitation, Invitation},
        project::Project,
        user::{User, UserRole},
    },
};

use super::{not_blank, trimmed};

#[derive(Debug, Deserialize, Validate)]
pub struct CreateInvitationRequest {
    #[serde(default, deserialize_with = "trimmed")]
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// `Foreman` or `Worker`
    #[serde(default)]
    #[validate(custom(function = "not_blank", message = "Role is required"))]
    pub role: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateInvitationResponse {
    pub message: String,
    pub email: String,
    pub role: UserRole,
    pub token: String,
    pub invite_link: String,
}

/// Creates a pending invitation into a project
///
/// # Errors
///
/// - `400 Bad Request`: missing email, missing role, role not Foreman/Worker
/// - `403 Forbidden`: caller is not an Owner
/// - `404 Not Found`: unknown project
/// - `409 Conflict`: the email already belongs to a user or has a pending invitation
pub async fn create_invitation(
    State(state): State<AppState>,
    Extension(session): Extension<SessionContext>,
    ApiPath(project_id): ApiPath<String>,
    ApiJson(req): ApiJson<CreateInvitationRequest>,
) -> ApiResult<(StatusCode, Json<CreateInvitationResponse>)> {
    session.authorize(Action::CreateInvitation)?;
    req.validate()?;

    let role = parse_invitable_role(&req.role)?;
    let email = req.email;

    if !Project::exists(&state.db, &project_id).await? {
        return Err(ApiError::NotFound("Project not found".to_string()));
    }

    if User::email_exists(&state.db, &email).await? {
        return Err(ApiError::Conflict(
            "A user with this email already exists".to_string(),
        ));
    }
    if Invitation::pending_exists_for_email(&state.db, &email).await? {
        return Err(ApiError::Conflict(
            "A pending invitation for this email already exists".to_string(),
        ));
    }

    let invitation = Invitation::create(
        &state.db,
        CreateInvitation {
            email,
            project_id,
            role,
        },
    )
    .await?;

    info!(
        invitation_id = invitation.id,
        project_id = %invitation.project_id,
        role = %invitation.role,
        invited_by = %session.user_id(),
        "Invitation created"
    );

    let link = invite_link(&state.config.invitations.public_base_url, &invitation.token);

    Ok((
        StatusCode::CREATED,
        Json(CreateInvitationResponse {
            message: "Invitation created successfully.".to_string(),
            email: invitation.email,
            role: invitation.role,
            token: invitation.token,
            invite_link: link,
        }),
    ))
}

fn parse_invitable_role(raw: &str) -> Result<UserRole, ApiError> {
    let role: UserRole = raw
        .trim()
        .parse()
        .map_err(|_| ApiError::BadRequest("Role must be Foreman or Worker".to_string()))?;

    if !role.is_invitable() {
        return Err(ApiError::BadRequest(
            "Role must be Foreman or Worker".to_string(),
        ));
    }
    Ok(role)
}

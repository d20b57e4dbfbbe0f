/// Project and membership endpoints
///
/// - `GET /api/v1/projects`: every project, by name
/// - `POST /api/v1/projects`: create a project owned by the caller
/// - `POST /api/v1/select-project/:project_id`: remember a project in the session
/// - `GET /api/v1/projects/:project_id/members`
/// - `PUT /api/v1/projects/:project_id/members/:user_id` (Owner, Foreman)
///
/// Project listing is not filtered by membership, and selecting a project
/// does not require being a member of it.

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
        project::{CreateProject, Project, ProjectRef},
        project_member::{ensure_membership, ProjectMember},
        session::Session,
        user::{User, UserSummary},
    },
};

use super::{non_empty, not_blank};

#[derive(Debug, Deserialize, Validate)]
pub struct CreateProjectRequest {
    /// Optional explicit id, e.g. `proj_gamma`
    #[validate(length(min = 1, max = 64, message = "Id must be 1 to 64 characters"))]
    pub id: Option<String>,

    #[serde(default)]
    #[validate(
        custom(function = "not_blank", message = "Name is required"),
        length(max = 200, message = "Name must be at most 200 characters")
    )]
    pub name: String,

    pub description: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SelectProjectResponse {
    pub success: bool,
    pub project: ProjectRef,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AddMemberResponse {
    pub project_id: String,
    pub user_id: String,
    /// False when the user already was a member
    pub added: bool,
}

pub async fn list_projects(
    State(state): State<AppState>,
    Extension(session): Extension<SessionContext>,
) -> ApiResult<Json<Vec<Project>>> {
    session.authorize(Action::ListProjects)?;

    Ok(Json(Project::list_all(&state.db).await?))
}

/// Creates a project; the caller becomes its owner and first member
///
/// # Errors
///
/// - `400 Bad Request`: blank name
/// - `409 Conflict`: explicit id already taken
pub async fn create_project(
    State(state): State<AppState>,
    Extension(session): Extension<SessionContext>,
    ApiJson(req): ApiJson<CreateProjectRequest>,
) -> ApiResult<(StatusCode, Json<Project>)> {
    session.authorize(Action::CreateProject)?;
    req.validate()?;

    let mut tx = state.db.begin().await?;

    let project = Project::create(
        &mut *tx,
        CreateProject {
            id: non_empty(req.id),
            name: req.name.trim().to_string(),
            description: non_empty(req.description),
            owner_id: session.user_id().to_string(),
        },
    )
    .await?;
    ensure_membership(&mut *tx, &project.id, session.user_id()).await?;

    tx.commit().await?;

    info!(project_id = %project.id, owner_id = %project.owner_id, "Project created");

    Ok((StatusCode::CREATED, Json(project)))
}

/// Stores the chosen project in the caller's session
pub async fn select_project(
    State(state): State<AppState>,
    Extension(session): Extension<SessionContext>,
    ApiPath(project_id): ApiPath<String>,
) -> ApiResult<Json<SelectProjectResponse>> {
    session.authorize(Action::SelectProject)?;

    let project = Project::find_by_id(&state.db, &project_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))?;

    Session::set_current_project(&state.db, &session.token_hash, &project.id).await?;

    Ok(Json(SelectProjectResponse {
        success: true,
        project: ProjectRef::from(&project),
    }))
}

pub async fn list_members(
    State(state): State<AppState>,
    Extension(session): Extension<SessionContext>,
    ApiPath(project_id): ApiPath<String>,
) -> ApiResult<Json<Vec<UserSummary>>> {
    session.authorize(Action::ListMembers)?;

    if !Project::exists(&state.db, &project_id).await? {
        return Err(ApiError::NotFound("Project not found".to_string()));
    }

    Ok(Json(ProjectMember::list_for_project(&state.db, &project_id).await?))
}

/// Adds a user to a project
///
/// Answers 201 when the membership was created and 200 when it already
/// existed.
pub async fn add_member(
    State(state): State<AppState>,
    Extension(session): Extension<SessionContext>,
    ApiPath((project_id, user_id)): ApiPath<(String, String)>,
) -> ApiResult<(StatusCode, Json<AddMemberResponse>)> {
    session.authorize(Action::AddMember)?;

    if !Project::exists(&state.db, &project_id).await? {
        return Err(ApiError::NotFound("Project not found".to_string()));
    }
    if User::find_by_id(&state.db, &user_id).await?.is_none() {
        return Err(ApiError::NotFound("User not found".to_string()));
    }

    let added = ensure_membership(&state.db, &project_id, &user_id).await?;
    let status = if added { StatusCode::CREATED } else { StatusCode::OK };

    Ok((
        status,
        Json(AddMemberResponse {
            project_id,
            user_id,
            added,
        }),
    ))
}

/// Task endpoints
///
/// - `GET /api/v1/projects/:project_id/tasks`: newest first
/// - `POST /api/v1/projects/:project_id/tasks`
/// - `GET /api/v1/tasks/:task_id`
/// - `PUT /api/v1/tasks/:task_id`: partial update
/// - `DELETE /api/v1/tasks/:task_id`
///
/// Assigning a task to someone who is not yet a member of its project
/// enrolls them in the same transaction.

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
        project::Project,
        task::{self as task_ops, CreateTask, Task, TaskDetail, TaskPriority, UpdateTask},
        user::User,
    },
};

use super::{non_empty, not_blank};

#[derive(Debug, Deserialize, Validate)]
pub struct CreateTaskRequest {
    #[serde(default)]
    #[validate(
        custom(function = "not_blank", message = "Title is required"),
        length(max = 255, message = "Title must be at most 255 characters")
    )]
    pub title: String,

    pub description: Option<String>,

    /// Free-form date string, stored as given
    pub due_date: Option<String>,

    /// Defaults to `Medium`
    pub priority: Option<TaskPriority>,

    /// Defaults to the caller
    pub assignee_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DeleteTaskResponse {
    pub success: bool,
    pub message: String,
}

pub async fn list_tasks(
    State(state): State<AppState>,
    Extension(session): Extension<SessionContext>,
    ApiPath(project_id): ApiPath<String>,
) -> ApiResult<Json<Vec<TaskDetail>>> {
    session.authorize(Action::ListTasks)?;

    if !Project::exists(&state.db, &project_id).await? {
        return Err(ApiError::NotFound("Project not found".to_string()));
    }

    Ok(Json(Task::list_for_project(&state.db, &project_id).await?))
}

/// Creates a task in a project
///
/// # Errors
///
/// - `400 Bad Request`: blank title
/// - `404 Not Found`: unknown project or assignee
pub async fn create_task(
    State(state): State<AppState>,
    Extension(session): Extension<SessionContext>,
    ApiPath(project_id): ApiPath<String>,
    ApiJson(req): ApiJson<CreateTaskRequest>,
) -> ApiResult<(StatusCode, Json<TaskDetail>)> {
    session.authorize(Action::CreateTask)?;
    req.validate()?;

    if !Project::exists(&state.db, &project_id).await? {
        return Err(ApiError::NotFound("Project not found".to_string()));
    }

    let assignee_id =
        non_empty(req.assignee_id).unwrap_or_else(|| session.user_id().to_string());
    if User::find_by_id(&state.db, &assignee_id).await?.is_none() {
        return Err(ApiError::NotFound("Assignee not found".to_string()));
    }

    let task = task_ops::create_task(
        &state.db,
        CreateTask {
            project_id,
            title: req.title.trim().to_string(),
            description: non_empty(req.description),
            priority: req.priority.unwrap_or_default(),
            due_date: non_empty(req.due_date),
            creator_id: session.user_id().to_string(),
            assignee_id,
        },
    )
    .await?;

    info!(
        task_id = task.task.id,
        project_id = %task.task.project_id,
        created_by = %session.user_id(),
        "Task created"
    );

    Ok((StatusCode::CREATED, Json(task)))
}

pub async fn get_task(
    State(state): State<AppState>,
    Extension(session): Extension<SessionContext>,
    ApiPath(task_id): ApiPath<i64>,
) -> ApiResult<Json<TaskDetail>> {
    session.authorize(Action::ViewTask)?;

    let task = Task::find_detail(&state.db, task_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    Ok(Json(task))
}

/// Applies a partial update
///
/// Only the supplied fields change; `null` clears description, due date or
/// assignee. An empty body returns the task unchanged.
///
/// # Errors
///
/// - `400 Bad Request`: supplied title or status is blank
/// - `404 Not Found`: unknown task or assignee
pub async fn update_task(
    State(state): State<AppState>,
    Extension(session): Extension<SessionContext>,
    ApiPath(task_id): ApiPath<i64>,
    ApiJson(changes): ApiJson<UpdateTask>,
) -> ApiResult<Json<TaskDetail>> {
    session.authorize(Action::UpdateTask)?;

    if changes.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
        return Err(ApiError::BadRequest("Title must not be blank".to_string()));
    }
    if changes.status.as_deref().is_some_and(|s| s.trim().is_empty()) {
        return Err(ApiError::BadRequest("Status must not be blank".to_string()));
    }
    if let Some(Some(assignee_id)) = &changes.assignee_id {
        if User::find_by_id(&state.db, assignee_id).await?.is_none() {
            return Err(ApiError::NotFound("Assignee not found".to_string()));
        }
    }

    let task = task_ops::update_task(&state.db, task_id, changes)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    Ok(Json(task))
}

/// Deletes a task together with its comments
pub async fn delete_task(
    State(state): State<AppState>,
    Extension(session): Extension<SessionContext>,
    ApiPath(task_id): ApiPath<i64>,
) -> ApiResult<Json<DeleteTaskResponse>> {
    session.authorize(Action::DeleteTask)?;

    if !Task::delete(&state.db, task_id).await? {
        return Err(ApiError::NotFound("Task not found".to_string()));
    }

    info!(task_id, deleted_by = %session.user_id(), "Task deleted");

    Ok(Json(DeleteTaskResponse {
        success: true,
        message: "Task deleted successfully.".to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_request_defaults() {
        let req: CreateTaskRequest =
            serde_json::from_str(r#"{"title": "Inspect site"}"#).unwrap();
        assert!(req.validate().is_ok());
        assert_eq!(req.priority, None);
        assert_eq!(req.assignee_id, None);
    }

    #[test]
    fn test_create_request_rejects_blank_title() {
        let req: CreateTaskRequest = serde_json::from_str(r#"{"title": "   "}"#).unwrap();
        let errors = req.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("title"));
    }

    #[test]
    fn test_create_request_parses_priority() {
        let req: CreateTaskRequest =
            serde_json::from_str(r#"{"title": "Pour slab", "priority": "High"}"#).unwrap();
        assert_eq!(req.priority, Some(TaskPriority::High));
    }
}

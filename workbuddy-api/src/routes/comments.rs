/// Task comment endpoints
///
/// - `GET /api/v1/tasks/:task_id/comments`: oldest first
/// - `POST /api/v1/tasks/:task_id/comments`

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
use serde::Deserialize;
use tracing::{debug, info};
use validator::Validate;
use workbuddy_shared::{
    auth::authorization::Action,
    models::{
        comment::{Comment, CreateComment},
        task::Task,
    },
};

use super::{non_empty, not_blank};

#[derive(Debug, Deserialize, Validate)]
pub struct AddCommentRequest {
    #[serde(default)]
    #[validate(custom(function = "not_blank", message = "Comment text is required"))]
    pub comment_text: String,

    /// Flags the comment as needing attention
    #[serde(default)]
    pub is_alert: bool,

    pub media_attachments: Option<String>,
}

pub async fn list_comments(
    State(state): State<AppState>,
    Extension(session): Extension<SessionContext>,
    ApiPath(task_id): ApiPath<i64>,
) -> ApiResult<Json<Vec<Comment>>> {
    session.authorize(Action::ListComments)?;

    if !Task::exists(&state.db, task_id).await? {
        return Err(ApiError::NotFound("Task not found".to_string()));
    }

    Ok(Json(Comment::list_for_task(&state.db, task_id).await?))
}

/// Adds a comment to a task, attributed to the caller
///
/// # Errors
///
/// - `400 Bad Request`: empty or whitespace-only text
/// - `404 Not Found`: unknown task
pub async fn add_comment(
    State(state): State<AppState>,
    Extension(session): Extension<SessionContext>,
    ApiPath(task_id): ApiPath<i64>,
    ApiJson(req): ApiJson<AddCommentRequest>,
) -> ApiResult<(StatusCode, Json<Comment>)> {
    session.authorize(Action::AddComment)?;
    req.validate()?;

    if !Task::exists(&state.db, task_id).await? {
        return Err(ApiError::NotFound("Task not found".to_string()));
    }

    let comment = Comment::create(
        &state.db,
        CreateComment {
            task_id,
            user_id: session.user_id().to_string(),
            comment_text: req.comment_text.trim().to_string(),
            is_alert: req.is_alert,
            media_attachments: non_empty(req.media_attachments),
        },
    )
    .await?;

    if comment.is_alert {
        info!(task_id, comment_id = comment.id, user_id = %session.user_id(), "Alert raised on task");
    } else {
        debug!(task_id, comment_id = comment.id, "Comment added");
    }

    Ok((StatusCode::CREATED, Json(comment)))
}

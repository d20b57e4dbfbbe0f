/// Chat endpoints
///
/// - `GET /api/v1/chat/:conversation_id/messages`: history, oldest first
/// - `POST /api/v1/chat/:conversation_id/messages`: persist and fan out
///
/// A conversation id is an opaque string with no backing row. Any logged-in
/// user may read or post to any conversation.

use crate::{
    app::AppState,
    error::ApiResult,
    extract::{ApiJson, ApiPath},
    middleware::session::SessionContext,
};
use axum::{
    extract::State,
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use tracing::debug;
use validator::Validate;
use workbuddy_shared::{
    auth::authorization::Action,
    models::message::Message,
    realtime::ServerEvent,
};

use super::not_blank;

#[derive(Debug, Deserialize, Validate)]
pub struct PostMessageRequest {
    #[serde(default)]
    #[validate(custom(function = "not_blank", message = "Message text is required"))]
    pub message_text: String,
}

pub async fn list_messages(
    State(state): State<AppState>,
    Extension(session): Extension<SessionContext>,
    ApiPath(conversation_id): ApiPath<String>,
) -> ApiResult<Json<Vec<Message>>> {
    session.authorize(Action::ListMessages)?;

    Ok(Json(
        Message::list_for_conversation(&state.db, &conversation_id).await?,
    ))
}

/// Persists a message, then pushes it to the conversation's room
///
/// Delivery is best-effort: subscribers whose connection is gone simply miss
/// the event, and the caller gets the stored message either way.
pub async fn post_message(
    State(state): State<AppState>,
    Extension(session): Extension<SessionContext>,
    ApiPath(conversation_id): ApiPath<String>,
    ApiJson(req): ApiJson<PostMessageRequest>,
) -> ApiResult<(StatusCode, Json<Message>)> {
    session.authorize(Action::PostMessage)?;
    req.validate()?;

    let message = Message::create(
        &state.db,
        &conversation_id,
        session.user_id(),
        req.message_text.trim(),
    )
    .await?;

    let delivered = state
        .hub
        .publish(&conversation_id, ServerEvent::NewMessage(message.clone()))
        .await;

    debug!(
        message_id = message.id,
        conversation_id = %conversation_id,
        delivered,
        "Chat message posted"
    );

    Ok((StatusCode::CREATED, Json(message)))
}

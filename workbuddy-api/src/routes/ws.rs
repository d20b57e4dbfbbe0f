/// WebSocket endpoint for chat rooms
///
/// `GET /ws` upgrades the connection. The server first sends a `connected`
/// frame, then the client joins and leaves rooms with `join_room` and
/// `leave_room` frames and receives `new_message` frames for every message
/// posted to a joined room. Closing the socket leaves all rooms.
///
/// Joining needs no session and no membership.

use crate::app::AppState;
use axum::{
    extract::{
        ws::{Message as WsMessage, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
};
use futures::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use workbuddy_shared::realtime::{ClientFrame, ConnectionId, EventSender, RoomHub, ServerEvent};

pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state.hub))
}

async fn handle_socket(socket: WebSocket, hub: Arc<RoomHub>) {
    let connection_id = hub.next_connection_id();
    let (mut sink, mut stream) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerEvent>();

    info!(connection_id, "WebSocket connected");

    // Single writer: every outgoing frame goes through the channel
    let forward = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            let text = match event.to_json() {
                Ok(text) => text,
                Err(e) => {
                    warn!(connection_id, error = %e, "Failed to encode server event");
                    continue;
                }
            };
            if sink.send(WsMessage::Text(text)).await.is_err() {
                break;
            }
        }
    });

    let _ = tx.send(ServerEvent::Connected { connection_id });

    while let Some(frame) = stream.next().await {
        match frame {
            Ok(WsMessage::Text(text)) => handle_frame(&hub, connection_id, &tx, &text).await,
            Ok(WsMessage::Close(_)) => break,
            Ok(_) => {}
            Err(e) => {
                debug!(connection_id, error = %e, "WebSocket receive failed");
                break;
            }
        }
    }

    let left = hub.disconnect(connection_id).await;
    drop(tx);
    forward.abort();

    info!(connection_id, rooms_left = left, "WebSocket disconnected");
}

async fn handle_frame(hub: &RoomHub, connection_id: ConnectionId, tx: &EventSender, text: &str) {
    match ClientFrame::parse(text) {
        Ok(ClientFrame::JoinRoom { conversation_id }) => {
            if hub.join(&conversation_id, connection_id, tx.clone()).await {
                debug!(connection_id, room = %conversation_id, "Joined room");
            }
        }
        Ok(ClientFrame::LeaveRoom { conversation_id }) => {
            if hub.leave(&conversation_id, connection_id).await {
                debug!(connection_id, room = %conversation_id, "Left room");
            }
        }
        Err(e) => {
            let _ = tx.send(ServerEvent::Error {
                message: format!("Invalid frame: {}", e),
            });
        }
    }
}

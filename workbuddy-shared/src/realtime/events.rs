/// WebSocket frame formats
///
/// Both directions use adjacently tagged JSON:
///
/// ```text
/// client → server   {"event":"join_room","data":{"conversation_id":"site-42"}}
///                   {"event":"leave_room","data":{"conversation_id":"site-42"}}
/// server → client   {"event":"connected","data":{"connection_id":7}}
///                   {"event":"new_message","data":{"id":1,"conversation_id":"site-42",...}}
///                   {"event":"error","data":{"message":"..."}}
/// ```

use serde::{Deserialize, Serialize};

use super::hub::ConnectionId;
use crate::models::message::Message;

/// Frames a client may send
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ClientFrame {
    JoinRoom { conversation_id: String },
    LeaveRoom { conversation_id: String },
}

/// Frames the server pushes to a client
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ServerEvent {
    /// First frame on every connection
    Connected { connection_id: ConnectionId },

    /// A chat message was posted to a room this connection joined
    NewMessage(Message),

    /// The last client frame could not be handled
    Error { message: String },
}

impl ClientFrame {
    /// Parses a text frame
    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

impl ServerEvent {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

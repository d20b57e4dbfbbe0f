/// Realtime chat fan-out
///
/// - [`hub`]: room registry and best-effort publishing
/// - [`events`]: JSON frames exchanged over the WebSocket
///
/// # Example
///
/// ```
/// use workbuddy_shared::realtime::{RoomHub, ServerEvent};
/// use tokio::sync::mpsc;
///
/// # async fn example() {
/// let hub = RoomHub::new();
/// let (tx, mut rx) = mpsc::unbounded_channel();
/// let id = hub.next_connection_id();
///
/// hub.join("site-42", id, tx).await;
/// hub.publish("site-42", ServerEvent::Error { message: "hello".into() }).await;
/// assert!(rx.recv().await.is_some());
/// # }
/// ```

pub mod events;
pub mod hub;

pub use events::{ClientFrame, ServerEvent};
pub use hub::{ConnectionId, EventSender, RoomHub};

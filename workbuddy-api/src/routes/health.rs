/// Health check endpoint
///
/// # Endpoint
///
/// ```text
/// GET /health
/// ```
///
/// # Response
///
/// ```json
/// {
///   "status": "healthy",
///   "version": "0.1.0",
///   "database": "connected",
///   "pool": { "active_connections": 1, "idle_connections": 2 },
///   "chat_rooms": 0
/// }
/// ```
///
/// Always answers 200; a failing database shows up as `"status": "degraded"`.

use crate::app::AppState;
use axum::{extract::State, Json};
use serde::Serialize;
use workbuddy_shared::db::pool::{health_check as db_health_check, pool_stats, PoolStats};

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub database: &'static str,
    pub pool: PoolStats,
    /// Rooms with at least one WebSocket subscriber
    pub chat_rooms: usize,
}

pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let connected = match db_health_check(&state.db).await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(error = %e, "Database health check failed");
            false
        }
    };

    Json(HealthResponse {
        status: if connected { "healthy" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        database: if connected { "connected" } else { "disconnected" },
        pool: pool_stats(&state.db),
        chat_rooms: state.hub.room_count().await,
    })
}

//! Health probes.

use axum::{extract::State, http::StatusCode, Json};
use persistence::db::{self, PoolStats};
use serde::Serialize;

use crate::app::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub database: DatabaseHealth,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct DatabaseHealth {
    pub connected: bool,
    pub latency_ms: Option<u64>,
    pub pool_size: u32,
    pub idle_connections: usize,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
}

/// Database round trip plus pool usage. 503 when the database is down.
///
/// GET /api/v1/health
pub async fn health_check(
    State(state): State<AppState>,
) -> Result<Json<HealthResponse>, StatusCode> {
    let latency = match db::ping(&state.pool).await {
        Ok(latency) => latency,
        Err(e) => {
            tracing::warn!(error = %e, "Health check failed: database unreachable");
            return Err(StatusCode::SERVICE_UNAVAILABLE);
        }
    };
    let pool = PoolStats::of(&state.pool);

    Ok(Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        database: DatabaseHealth {
            connected: true,
            latency_ms: Some(latency.as_millis() as u64),
            pool_size: pool.size,
            idle_connections: pool.idle,
        },
    }))
}

/// GET /api/v1/health/live
pub async fn live() -> Json<StatusResponse> {
    Json(StatusResponse { status: "alive" })
}

/// Ready once the database answers.
///
/// GET /api/v1/health/ready
pub async fn ready(State(state): State<AppState>) -> Result<Json<StatusResponse>, StatusCode> {
    db::ping(&state.pool)
        .await
        .map(|_| Json(StatusResponse { status: "ready" }))
        .map_err(|_| StatusCode::SERVICE_UNAVAILABLE)
}

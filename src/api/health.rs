//! Liveness and health endpoints.

use axum::{extract::State, Json};
use serde::Serialize;

use crate::server::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub queue: QueueHealthResponse,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub postgres: Option<PostgresHealthResponse>,
}

#[derive(Debug, Serialize)]
pub struct QueueHealthResponse {
    pub backend: String,
    pub lock_scope: String,
}

#[derive(Debug, Serialize)]
pub struct PostgresHealthResponse {
    pub connected: bool,
    pub circuit_breaker_state: String,
    pub circuit_breaker_failures: u32,
    pub pool_size: u32,
    pub idle_connections: u32,
}

/// GET /ping
pub async fn ping() -> &'static str {
    "pong"
}

/// GET /health
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let postgres = state.postgres_pool.as_ref().map(|pool| {
        let breaker = pool.circuit_breaker().stats();
        let inner_pool = pool.pool();
        PostgresHealthResponse {
            connected: pool.is_available(),
            circuit_breaker_state: breaker.state.as_str().to_string(),
            circuit_breaker_failures: breaker.failure_count,
            pool_size: inner_pool.size(),
            idle_connections: inner_pool.num_idle() as u32,
        }
    });

    let degraded = postgres.as_ref().is_some_and(|pg| !pg.connected);
    let status = if degraded { "degraded" } else { "healthy" };

    Json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        queue: QueueHealthResponse {
            backend: state.queue_service.store().backend_name().to_string(),
            lock_scope: state.queue_service.lock_scope().as_str().to_string(),
        },
        postgres,
    })
}

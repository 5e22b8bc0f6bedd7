use crate::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;
use std::{sync::OnceLock, time::Instant};
use utoipa::ToSchema;

/// Tracks application start time for uptime calculation
static START_TIME: OnceLock<Instant> = OnceLock::new();

/// Initialize the start time (call this on application startup)
pub fn init_start_time() {
    let _ = START_TIME.get_or_init(Instant::now);
}

fn uptime_secs() -> u64 {
    START_TIME.get().map(|t| t.elapsed().as_secs()).unwrap_or(0)
}

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// `up` or `down`
    pub status: String,
    pub version: String,
    pub timestamp: String,
    pub uptime_secs: u64,
    pub database: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database_latency_ms: Option<u64>,
}

/// Liveness probe; answers 503 when the database does not respond
#[utoipa::path(
    get,
    path = "/health",
    summary = "Health check",
    responses(
        (status = 200, description = "Service and database are up", body = HealthResponse),
        (status = 503, description = "Database unreachable", body = HealthResponse),
    ),
    tag = "health"
)]
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let db = crate::db::check_connection(&state.db).await;

    let (status, database, latency) = match db {
        Ok(elapsed) => (StatusCode::OK, "up", Some(elapsed.as_millis() as u64)),
        Err(_) => (StatusCode::SERVICE_UNAVAILABLE, "down", None),
    };

    (
        status,
        Json(HealthResponse {
            status: database.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            uptime_secs: uptime_secs(),
            database: database.to_string(),
            database_latency_ms: latency,
        }),
    )
}

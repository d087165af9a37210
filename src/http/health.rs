//! Liveness endpoint.

use axum::{extract::State, Json};
use serde::Serialize;

use crate::http::server::AppState;

/// Path the health endpoint is mounted on.
pub const HEALTH_PATH: &str = "/healthz";

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub version: &'static str,
    pub station: String,
    pub active_sessions: usize,
}

pub async fn health_handler(State(state): State<AppState>) -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        station: state.upstream.name().to_string(),
        active_sessions: state.sessions.active(),
    })
}

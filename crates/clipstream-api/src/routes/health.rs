//! Health check endpoint for load balancers and container probes.

use axum::{extract::State, routing::get, Router};
use clipstream_common::response::ApiResponse;
use serde::Serialize;
use std::sync::Arc;

use crate::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: String,
    version: String,
    uptime_secs: u64,
}

/// Health check router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/healthcheck", get(health_check))
}

/// GET /api/v1/healthcheck
async fn health_check(State(state): State<Arc<AppState>>) -> ApiResponse<HealthResponse> {
    let store_ok = state.sessions.store().health_check().await;
    if !store_ok {
        tracing::warn!("Credential store failed its health check");
    }

    ApiResponse::ok(
        HealthResponse {
            status: if store_ok {
                "healthy".into()
            } else {
                "degraded".into()
            },
            version: env!("CARGO_PKG_VERSION").to_string(),
            uptime_secs: state.started_at.elapsed().as_secs(),
        },
        "Health check successfully passed",
    )
}

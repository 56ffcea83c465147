//! Liveness endpoint.

use axum::extract::State;
use serde::Serialize;

use crate::{ApiResponse, AppState};

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub version: &'static str,
}

/// Report liveness and the running version.
pub async fn health(State(state): State<AppState>) -> ApiResponse<HealthStatus> {
    if let Some(pool) = &state.pool {
        entityinfo_db::log_pool_metrics(pool);
    }
    ApiResponse::ok(HealthStatus {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

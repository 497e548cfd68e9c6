//! Liveness endpoint for load balancers and the deploy smoke check
//!
//! Mounted outside the access-token layer and never touches the movie store.

use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::AppState;

/// Body of `GET /health`
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Always `"ok"` while the process is serving requests
    pub status: String,
    /// Crate name of the running binary
    pub module: String,
    pub version: String,
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        module: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Unauthenticated routes, merged next to the `/api/v1` movie routes
pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}

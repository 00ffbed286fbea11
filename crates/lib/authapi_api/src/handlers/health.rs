//! Liveness endpoint.

use axum::Json;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// `GET /health`: always `{"status":"OK"}`.
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse { status: "OK" })
}

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;

use crate::state::AppState;

pub const SERVICE_NAME: &str = "EcoSentinel AI Service";

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: &'static str,
    service: &'static str,
    version: &'static str,
    models_loaded: usize,
    timestamp: chrono::DateTime<chrono::Utc>,
}

/// GET /health - Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy",
        service: SERVICE_NAME,
        version: env!("CARGO_PKG_VERSION"),
        models_loaded: state.engine.bank().model_count(),
        timestamp: chrono::Utc::now(),
    })
}

/// GET /health/ready - Readiness probe
///
/// The engine is trained before the listener binds, so a running server is ready.
pub async fn readiness_check(State(state): State<AppState>) -> impl IntoResponse {
    if state.engine.bank().model_count() > 0 {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

/// GET /health/live - Liveness probe
pub async fn liveness_check() -> impl IntoResponse {
    StatusCode::OK
}

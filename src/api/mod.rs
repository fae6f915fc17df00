pub mod error;
pub mod health;
pub mod insights;
pub mod metrics;
pub mod model_info;
pub mod predict;

use axum::{
    body::Bytes,
    http::{header, HeaderValue, Method, StatusCode},
    routing::{get, post},
    Router,
};
use serde_json::Value;
use std::time::Instant;
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::warn;

use self::error::ApiError;
use self::metrics::Outcome;
use crate::state::AppState;

const NO_INPUT: &str = "No input data provided";

pub fn router(state: AppState) -> Router {
    let server = state.cfg.server.clone();

    let mut router = Router::new()
        .route("/health", get(health::health_check))
        .route("/health/live", get(health::liveness_check))
        .route("/health/ready", get(health::readiness_check))
        .route("/metrics", get(metrics::metrics_handler))
        .route("/predict", post(predict::predict))
        .route("/insights", post(insights::generate_insights))
        .route("/model-info", get(model_info::model_info))
        .fallback(not_found)
        .with_state(state);

    if server.enable_cors {
        let origins: Vec<HeaderValue> = server
            .cors_allowed_origins
            .iter()
            .filter_map(|origin| match origin.parse() {
                Ok(value) => Some(value),
                Err(_) => {
                    warn!(%origin, "ignoring invalid CORS origin");
                    None
                }
            })
            .collect();
        let allow_origin = if origins.is_empty() {
            AllowOrigin::from(Any)
        } else {
            AllowOrigin::list(origins)
        };
        let cors = CorsLayer::new()
            .allow_origin(allow_origin)
            .allow_methods([Method::GET, Method::POST])
            .allow_headers([header::CONTENT_TYPE]);
        router = router.layer(cors);
    }

    router
        .layer(
            ServiceBuilder::new()
                .layer(axum::extract::DefaultBodyLimit::max(1024 * 1024))
                .layer(TimeoutLayer::with_status_code(
                    StatusCode::REQUEST_TIMEOUT,
                    server.request_timeout(),
                )),
        )
        .layer(TraceLayer::new_for_http())
}

async fn not_found() -> ApiError {
    ApiError::NotFound("no such endpoint".to_string())
}

/// Parse a request body that must be a non-empty JSON object
pub(crate) fn require_payload(body: &Bytes) -> Result<Value, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(ApiError::BadRequest(NO_INPUT.to_string()));
    }
    let payload: Value = serde_json::from_slice(body)?;
    match &payload {
        Value::Null => Err(ApiError::BadRequest(NO_INPUT.to_string())),
        Value::Object(map) if map.is_empty() => Err(ApiError::BadRequest(NO_INPUT.to_string())),
        Value::Object(_) => Ok(payload),
        _ => Err(ApiError::BadRequest("expected a JSON object".to_string())),
    }
}

/// Time a handler body and count its outcome
pub(crate) async fn instrumented<T, F>(
    state: &AppState,
    endpoint: &'static str,
    handler: F,
) -> Result<T, ApiError>
where
    F: std::future::Future<Output = Result<(T, Outcome), ApiError>>,
{
    let started = Instant::now();
    let result = handler.await;
    state
        .metrics
        .observe_duration(started.elapsed().as_secs_f64());
    match result {
        Ok((value, outcome)) => {
            state.metrics.record_request(endpoint, outcome);
            Ok(value)
        }
        Err(e) => {
            state.metrics.record_request(endpoint, Outcome::Error);
            Err(e)
        }
    }
}

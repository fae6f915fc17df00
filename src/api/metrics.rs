//! Prometheus request and accuracy metrics

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use prometheus::{Encoder, Histogram, HistogramOpts, IntCounterVec, Opts, Registry, TextEncoder};
use strum::{Display, IntoStaticStr};

use super::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum Outcome {
    Success,
    Error,
    CacheHit,
}

pub struct ApiMetrics {
    registry: Registry,
    requests: IntCounterVec,
    duration: Histogram,
    accuracy: Histogram,
}

impl ApiMetrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let requests = IntCounterVec::new(
            Opts::new("ai_requests_total", "Total AI requests"),
            &["endpoint", "status"],
        )?;
        let duration = Histogram::with_opts(HistogramOpts::new(
            "ai_request_duration_seconds",
            "AI request duration",
        ))?;
        let accuracy = Histogram::with_opts(
            HistogramOpts::new("ai_prediction_accuracy", "AI prediction accuracy scores")
                .buckets(vec![0.5, 0.6, 0.7, 0.8, 0.9, 0.95, 0.99, 1.0]),
        )?;

        registry.register(Box::new(requests.clone()))?;
        registry.register(Box::new(duration.clone()))?;
        registry.register(Box::new(accuracy.clone()))?;

        Ok(Self {
            registry,
            requests,
            duration,
            accuracy,
        })
    }

    pub fn record_request(&self, endpoint: &str, outcome: Outcome) {
        let status: &'static str = outcome.into();
        self.requests.with_label_values(&[endpoint, status]).inc();
    }

    pub fn request_count(&self, endpoint: &str, outcome: Outcome) -> u64 {
        let status: &'static str = outcome.into();
        self.requests.with_label_values(&[endpoint, status]).get()
    }

    pub fn observe_duration(&self, seconds: f64) {
        self.duration.observe(seconds);
    }

    pub fn observe_accuracy(&self, r2: f64) {
        self.accuracy.observe(r2);
    }

    /// Prometheus text exposition of every registered metric
    pub fn export(&self) -> Result<String, ApiError> {
        let mut buffer = Vec::new();
        TextEncoder::new()
            .encode(&self.registry.gather(), &mut buffer)
            .map_err(|e| ApiError::InternalError(format!("encoding metrics: {e}")))?;
        String::from_utf8(buffer)
            .map_err(|e| ApiError::InternalError(format!("metrics are not UTF-8: {e}")))
    }
}

/// GET /metrics
pub async fn metrics_handler(State(state): State<AppState>) -> Result<Response, ApiError> {
    let body = state.metrics.export()?;
    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
        body,
    )
        .into_response())
}

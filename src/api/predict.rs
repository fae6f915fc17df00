use axum::{body::Bytes, extract::State, Json};
use chrono::{DateTime, FixedOffset, Local, Utc};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::debug;
use validator::Validate;

use super::{error::ApiError, instrumented, metrics::Outcome, require_payload};
use crate::cache::{cache_key, PREDICTIONS_PREFIX};
use crate::domain::{Observation, PredictionResult};
use crate::engine::PredictionError;
use crate::ml::{AccuracyRecord, ImportanceRecord};
use crate::state::AppState;

const ENDPOINT: &str = "predict";

#[derive(Debug, Serialize)]
struct TrainingSummary<'a> {
    accuracies: &'a AccuracyRecord,
    feature_importance: &'a ImportanceRecord,
}

#[derive(Debug, Serialize)]
struct PredictResponse<'a> {
    predictions: PredictionResult,
    model_info: TrainingSummary<'a>,
    timestamp: DateTime<Utc>,
}

/// POST /predict
pub async fn predict(State(st): State<AppState>, body: Bytes) -> Result<Json<Value>, ApiError> {
    let now = Local::now().fixed_offset();
    instrumented(&st, ENDPOINT, handle(&st, &body, now)).await
}

/// Cached entries are keyed on the resolved feature row, so calendar fields
/// filled from `now` are part of the key
async fn handle(
    st: &AppState,
    body: &Bytes,
    now: DateTime<FixedOffset>,
) -> Result<(Json<Value>, Outcome), ApiError> {
    let payload = require_payload(body)?;
    let observation: Observation = serde_json::from_value(payload)?;
    observation.validate().map_err(PredictionError::from)?;
    let key = cache_key(PREDICTIONS_PREFIX, &json!(observation.resolve(&now)));
    let timestamp = now.with_timezone(&Utc);

    if let Some(mut cached) = st.cache.get(&key).await {
        debug!(%key, "prediction served from cache");
        if let Some(fields) = cached.as_object_mut() {
            fields.insert("timestamp".to_string(), json!(timestamp));
        }
        return Ok((Json(cached), Outcome::CacheHit));
    }

    let predictions = st.engine.predict_at(&observation, &now)?;
    let bank = st.engine.bank();
    let response = serde_json::to_value(PredictResponse {
        predictions,
        model_info: TrainingSummary {
            accuracies: bank.accuracies(),
            feature_importance: bank.feature_importance(),
        },
        timestamp,
    })
    .map_err(|e| ApiError::InternalError(format!("serializing prediction: {e}")))?;

    st.cache
        .set_with_expiry(&key, response.clone(), st.cfg.cache.prediction_ttl())
        .await;
    Ok((Json(response), Outcome::Success))
}

use axum::{
    body::Bytes,
    extract::{Query, State},
    Json,
};
use chrono::{DateTime, FixedOffset, Local};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;
use validator::Validate;

use super::{error::ApiError, instrumented, metrics::Outcome, require_payload};
use crate::cache::{cache_key, INSIGHTS_PREFIX};
use crate::domain::{InsightInput, Observation};
use crate::engine::PredictionError;
use crate::state::AppState;

const ENDPOINT: &str = "insights";

#[derive(Debug, Default, Deserialize)]
pub struct InsightsQuery {
    /// Fill missing readings from the prediction pipeline before narrating
    #[serde(default)]
    pub forecast: bool,
}

/// POST /insights
pub async fn generate_insights(
    State(st): State<AppState>,
    Query(query): Query<InsightsQuery>,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    let now = Local::now().fixed_offset();
    instrumented(&st, ENDPOINT, handle(&st, query.forecast, &body, now)).await
}

async fn handle(
    st: &AppState,
    forecast: bool,
    body: &Bytes,
    now: DateTime<FixedOffset>,
) -> Result<(Json<Value>, Outcome), ApiError> {
    let payload = require_payload(body)?;
    let input: InsightInput = serde_json::from_value(payload.clone())?;

    // The forecast path depends on the resolved observation, clock included
    let observation = if forecast {
        let observation: Observation = serde_json::from_value(payload.clone())?;
        observation.validate().map_err(PredictionError::from)?;
        Some(observation)
    } else {
        None
    };
    let key = match &observation {
        Some(observation) => cache_key(
            INSIGHTS_PREFIX,
            &json!({ "forecast": observation.resolve(&now), "input": payload }),
        ),
        None => cache_key(INSIGHTS_PREFIX, &payload),
    };
    if let Some(cached) = st.cache.get(&key).await {
        debug!(%key, "insight served from cache");
        return Ok((Json(cached), Outcome::CacheHit));
    }

    let insight = match &observation {
        Some(observation) => {
            st.engine
                .generate_forecast_insight_at(observation, &input, &now)
                .await?
        }
        None => st.engine.generate_insight(&input).await?,
    };

    let response = serde_json::to_value(insight)
        .map_err(|e| ApiError::InternalError(format!("serializing insight: {e}")))?;
    st.cache
        .set_with_expiry(&key, response.clone(), st.cfg.cache.insight_ttl())
        .await;
    Ok((Json(response), Outcome::Success))
}

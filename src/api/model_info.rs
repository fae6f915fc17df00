use axum::{extract::State, Json};

use crate::engine::ModelInfo;
use crate::state::AppState;

/// GET /model-info
pub async fn model_info(State(st): State<AppState>) -> Json<ModelInfo> {
    Json(st.engine.model_info())
}

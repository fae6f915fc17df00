use thiserror::Error;

use crate::insights::InsightError;
use crate::ml::Quantity;

#[derive(Debug, Error)]
pub enum PredictionError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("{quantity} model failed: {message}")]
    Model { quantity: Quantity, message: String },
}

impl PredictionError {
    pub(crate) fn model(quantity: Quantity, err: anyhow::Error) -> Self {
        PredictionError::Model {
            quantity,
            message: format!("{err:#}"),
        }
    }
}

impl From<validator::ValidationErrors> for PredictionError {
    fn from(err: validator::ValidationErrors) -> Self {
        PredictionError::InvalidInput(err.to_string())
    }
}

/// Failure of a request that chains prediction and narration
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Prediction(#[from] PredictionError),

    #[error(transparent)]
    Insight(#[from] InsightError),
}

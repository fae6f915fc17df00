//! Machine Learning Module
//!
//! This module provides the statistical models behind the inference engine:
//! - Random-forest regressors for air quality, temperature and composite risk
//! - An isolation-forest anomaly detector
//! - Standard scaling of the raw feature columns
//! - In-sample goodness-of-fit and permutation feature importance
//!
//! # Architecture
//! - [`bank::ModelBank`] trains every model once and is read-only afterwards
//! - Regressors sit behind the [`Regressor`] trait so training metrics are
//!   computed the same way for any model

use anyhow::Result;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, IntoStaticStr};

pub mod bank;
pub mod isolation_forest;
pub mod random_forest;
pub mod scaler;
pub mod training;

pub use bank::{AccuracyRecord, AnomalyVerdict, ImportanceRecord, ModelBank, ModelBankConfig};
pub use isolation_forest::IsolationForest;
pub use random_forest::SmartcoreRandomForest;
pub use scaler::StandardScaler;

/// Quantities the model bank keeps a model for
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Display,
    EnumIter, IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Quantity {
    AirQuality,
    Temperature,
    RiskPredictor,
    AnomalyDetector,
}

impl Quantity {
    /// Quantities backed by a supervised regressor
    pub const REGRESSORS: [Quantity; 3] = [
        Quantity::AirQuality,
        Quantity::Temperature,
        Quantity::RiskPredictor,
    ];
}

/// Validation Metrics
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ValidationMetrics {
    pub mae: f64,  // Mean Absolute Error
    pub rmse: f64, // Root Mean Square Error
    pub r2: f64,   // R-squared
}

impl ValidationMetrics {
    pub fn new(mae: f64, rmse: f64, r2: f64) -> Self {
        Self { mae, rmse, r2 }
    }
}

/// A fitted regression model
pub trait Regressor: Send + Sync {
    /// Predict one value per feature row
    fn predict(&self, rows: &[Vec<f64>]) -> Result<Vec<f64>>;
}

use serde::{Deserialize, Serialize};

use super::{AqiCategory, RiskLevel};

/// Reference decision threshold reported with every anomaly verdict.
///
/// Callers may use it for their own alerting; the detector's binary outlier
/// decision is never overridden by it.
pub const ANOMALY_THRESHOLD: f64 = -0.1;

/// Predicted air-quality index with its health category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AirQualityPrediction {
    pub value: f64,
    pub category: AqiCategory,
    pub confidence: f64,
}

/// Predicted temperature (°C)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemperaturePrediction {
    pub value: f64,
    pub confidence: f64,
}

/// Composite risk score (0-100 scale, not clamped at inference) and its level
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub score: f64,
    pub level: RiskLevel,
    pub confidence: f64,
}

/// Isolation-forest verdict for the raw observation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyDetection {
    pub is_anomaly: bool,
    pub anomaly_score: f64,
    pub threshold: f64,
}

/// Everything the prediction pipeline produces for one observation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub air_quality: AirQualityPrediction,
    pub temperature: TemperaturePrediction,
    pub risk_assessment: RiskAssessment,
    pub anomaly_detection: AnomalyDetection,
}

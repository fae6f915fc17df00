//! Health categorization rules for air quality and composite risk
//!
//! Both rule sets are pure and total: every `f64` (negative, out of range or
//! NaN) maps to exactly one label, with inclusive upper bucket boundaries.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, IntoStaticStr};

/// US EPA style air-quality category, ordered from best to worst
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Display,
    EnumIter, IntoStaticStr,
)]
pub enum AqiCategory {
    #[serde(rename = "Good")]
    #[strum(serialize = "Good")]
    Good,
    #[serde(rename = "Moderate")]
    #[strum(serialize = "Moderate")]
    Moderate,
    #[serde(rename = "Unhealthy for Sensitive Groups")]
    #[strum(serialize = "Unhealthy for Sensitive Groups")]
    UnhealthyForSensitiveGroups,
    #[serde(rename = "Unhealthy")]
    #[strum(serialize = "Unhealthy")]
    Unhealthy,
    #[serde(rename = "Very Unhealthy")]
    #[strum(serialize = "Very Unhealthy")]
    VeryUnhealthy,
    #[serde(rename = "Hazardous")]
    #[strum(serialize = "Hazardous")]
    Hazardous,
}

impl AqiCategory {
    /// Categorize a numeric AQI value
    pub fn from_aqi(aqi: f64) -> Self {
        if aqi <= 50.0 {
            Self::Good
        } else if aqi <= 100.0 {
            Self::Moderate
        } else if aqi <= 150.0 {
            Self::UnhealthyForSensitiveGroups
        } else if aqi <= 200.0 {
            Self::Unhealthy
        } else if aqi <= 300.0 {
            Self::VeryUnhealthy
        } else {
            Self::Hazardous
        }
    }
}

/// Composite environmental risk level on a 0-100 score scale
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Display,
    EnumIter, IntoStaticStr,
)]
pub enum RiskLevel {
    Low,
    Moderate,
    High,
    Critical,
}

impl RiskLevel {
    /// Categorize a numeric risk score
    pub fn from_score(score: f64) -> Self {
        if score <= 30.0 {
            Self::Low
        } else if score <= 60.0 {
            Self::Moderate
        } else if score <= 80.0 {
            Self::High
        } else {
            Self::Critical
        }
    }
}

/// Air-quality category for an AQI value
pub fn aqi_category(aqi: f64) -> AqiCategory {
    AqiCategory::from_aqi(aqi)
}

/// Risk level for a risk score
pub fn risk_level(score: f64) -> RiskLevel {
    RiskLevel::from_score(score)
}

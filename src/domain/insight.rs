//! Narrative insight request and result types

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::{Display, IntoStaticStr};

/// Confidence attached to narratives produced by the language model
pub const LLM_CONFIDENCE: f64 = 0.85;
/// Confidence attached to rule-based narratives
pub const FALLBACK_CONFIDENCE: f64 = 0.70;

/// Inputs with more supplied fields than this are rated "high" quality
const HIGH_QUALITY_FIELD_COUNT: usize = 5;

/// Observation (or dashboard summary) to narrate
///
/// The well-known readings are typed; anything else the caller sends is kept
/// in `extra` and only counts towards the data-quality rating.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InsightInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub air_quality: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub humidity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wind_speed: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl InsightInput {
    /// Number of fields the caller supplied
    pub fn field_count(&self) -> usize {
        let typed = [
            self.air_quality.is_some(),
            self.temperature.is_some(),
            self.humidity.is_some(),
            self.wind_speed.is_some(),
            self.location.is_some(),
        ]
        .into_iter()
        .filter(|present| *present)
        .count();
        typed + self.extra.len()
    }
}

/// Which generation path produced a narrative
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, IntoStaticStr)]
pub enum ModelUsed {
    #[serde(rename = "LLM")]
    #[strum(serialize = "LLM")]
    Llm,
    #[serde(rename = "rule-based fallback")]
    #[strum(serialize = "rule-based fallback")]
    RuleBasedFallback,
}

/// Coarse rating of how much input the narrative was based on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum DataQuality {
    High,
    Moderate,
}

impl DataQuality {
    pub fn from_field_count(fields: usize) -> Self {
        if fields > HIGH_QUALITY_FIELD_COUNT {
            Self::High
        } else {
            Self::Moderate
        }
    }
}

/// Natural-language summary with its provenance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsightResult {
    pub ai_generated_insights: String,
    pub model_used: ModelUsed,
    pub confidence: f64,
    pub generated_at: DateTime<Utc>,
    pub data_quality: DataQuality,
}

impl InsightResult {
    /// Wrap text returned by the language model; `supplied_fields` counts
    /// what the caller sent, not what was filled in afterwards
    pub fn from_llm(text: String, supplied_fields: usize) -> Self {
        Self {
            ai_generated_insights: text,
            model_used: ModelUsed::Llm,
            confidence: LLM_CONFIDENCE,
            generated_at: Utc::now(),
            data_quality: DataQuality::from_field_count(supplied_fields),
        }
    }

    /// Wrap a rule-based narrative; its quality rating is always moderate
    pub fn from_rules(text: String) -> Self {
        Self {
            ai_generated_insights: text,
            model_used: ModelUsed::RuleBasedFallback,
            confidence: FALLBACK_CONFIDENCE,
            generated_at: Utc::now(),
            data_quality: DataQuality::Moderate,
        }
    }
}

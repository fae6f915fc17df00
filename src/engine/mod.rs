//! # Inference Engine
//!
//! Facade over the trained [`ModelBank`] and the [`NarrativeGenerator`].
//! Built once at startup and shared by handle; every operation is read-only
//! on the models.

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Local, TimeZone, Utc};
use serde::Serialize;
use tracing::{debug, info};
use validator::Validate;

mod error;

pub use error::{EngineError, PredictionError};

use crate::domain::{
    aqi_category, risk_level, AirQualityPrediction, AnomalyDetection, InsightInput,
    InsightResult, Observation, PredictionResult, RiskAssessment, TemperaturePrediction,
    ANOMALY_THRESHOLD,
};
use crate::insights::{InsightError, NarrativeGenerator};
use crate::ml::{AccuracyRecord, ImportanceRecord, ModelBank, ModelBankConfig, Quantity};
use crate::simulation::CorpusSource;

/// Snapshot of what the engine was trained on and how well it fits
#[derive(Debug, Clone, Serialize)]
pub struct ModelInfo {
    pub models: Vec<Quantity>,
    pub accuracies: AccuracyRecord,
    pub feature_importance: ImportanceRecord,
    pub training_samples: usize,
    pub last_trained: DateTime<Utc>,
}

pub struct InferenceEngine {
    bank: Arc<ModelBank>,
    narrator: NarrativeGenerator,
}

impl InferenceEngine {
    pub fn new(bank: Arc<ModelBank>, narrator: NarrativeGenerator) -> Self {
        Self { bank, narrator }
    }

    /// Load a corpus and train every model; any failure is fatal
    pub fn bootstrap(
        source: &dyn CorpusSource,
        config: &ModelBankConfig,
        narrator: NarrativeGenerator,
    ) -> Result<Self> {
        let corpus = source.load().context("loading training corpus")?;
        let bank = ModelBank::train(&corpus, config).context("training model bank")?;
        info!(
            models = bank.model_count(),
            samples = bank.training_samples(),
            "inference engine ready"
        );
        Ok(Self::new(Arc::new(bank), narrator))
    }

    pub fn bank(&self) -> &ModelBank {
        &self.bank
    }

    pub fn narrator(&self) -> &NarrativeGenerator {
        &self.narrator
    }

    /// Predict against the local clock
    pub fn predict(&self, observation: &Observation) -> Result<PredictionResult, PredictionError> {
        self.predict_at(observation, &Local::now())
    }

    /// Predict, filling calendar defaults from `now`
    pub fn predict_at<Tz: TimeZone>(
        &self,
        observation: &Observation,
        now: &DateTime<Tz>,
    ) -> Result<PredictionResult, PredictionError> {
        observation.validate()?;
        let row = observation.resolve(now);
        if row.to_vec().iter().any(|v| !v.is_finite()) {
            return Err(PredictionError::InvalidInput(
                "readings must be finite numbers".to_string(),
            ));
        }

        let regress = |quantity: Quantity| -> Result<(f64, f64), PredictionError> {
            let value = self
                .bank
                .predict(quantity, &row)
                .map_err(|e| PredictionError::model(quantity, e))?;
            let confidence = self.bank.accuracy(quantity).ok_or_else(|| PredictionError::Model {
                quantity,
                message: "no accuracy recorded".to_string(),
            })?;
            Ok((value, confidence))
        };

        let (aqi, aqi_confidence) = regress(Quantity::AirQuality)?;
        let (temperature, temperature_confidence) = regress(Quantity::Temperature)?;
        let (risk, risk_confidence) = regress(Quantity::RiskPredictor)?;
        let verdict = self
            .bank
            .detect_anomaly(&row)
            .map_err(|e| PredictionError::model(Quantity::AnomalyDetector, e))?;

        debug!(aqi, temperature, risk, anomaly = verdict.is_outlier, "prediction complete");

        Ok(PredictionResult {
            air_quality: AirQualityPrediction {
                value: aqi,
                category: aqi_category(aqi),
                confidence: aqi_confidence,
            },
            temperature: TemperaturePrediction {
                value: temperature,
                confidence: temperature_confidence,
            },
            risk_assessment: RiskAssessment {
                score: risk,
                level: risk_level(risk),
                confidence: risk_confidence,
            },
            anomaly_detection: AnomalyDetection {
                is_anomaly: verdict.is_outlier,
                anomaly_score: verdict.score,
                threshold: ANOMALY_THRESHOLD,
            },
        })
    }

    /// Narrate an observation; dependency failures yield the rule-based text
    pub async fn generate_insight(
        &self,
        input: &InsightInput,
    ) -> Result<InsightResult, InsightError> {
        self.narrator.generate(input).await
    }

    /// Predict first, then narrate with missing readings filled from the forecast
    pub async fn generate_forecast_insight(
        &self,
        observation: &Observation,
        input: &InsightInput,
    ) -> Result<InsightResult, EngineError> {
        self.generate_forecast_insight_at(observation, input, &Local::now())
            .await
    }

    /// Forecast-enriched narrative with calendar defaults taken from `now`
    ///
    /// Data quality reflects only the fields the caller supplied.
    pub async fn generate_forecast_insight_at<Tz: TimeZone>(
        &self,
        observation: &Observation,
        input: &InsightInput,
        now: &DateTime<Tz>,
    ) -> Result<InsightResult, EngineError> {
        let prediction = self.predict_at(observation, now)?;
        let mut enriched = input.clone();
        enriched
            .air_quality
            .get_or_insert(prediction.air_quality.value);
        enriched
            .temperature
            .get_or_insert(prediction.temperature.value);
        Ok(self.narrator.narrate(&enriched, input.field_count()).await?)
    }

    pub fn model_info(&self) -> ModelInfo {
        ModelInfo {
            models: self.bank.model_names(),
            accuracies: self.bank.accuracies().clone(),
            feature_importance: self.bank.feature_importance().clone(),
            training_samples: self.bank.training_samples(),
            last_trained: self.bank.trained_at(),
        }
    }
}

//! Model bank: every fitted model, its scaler, and training-time statistics
//!
//! The bank is built once from a [`TrainingCorpus`] and is read-only for the
//! rest of the process lifetime, so it can be shared behind an `Arc` without
//! locking.

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::training::{permutation_importance, regression_metrics};
use super::{IsolationForest, Quantity, Regressor, SmartcoreRandomForest, StandardScaler};
use crate::domain::{FeatureRow, FEATURE_NAMES, N_FEATURES};
use crate::simulation::TrainingCorpus;

/// Quantity name -> in-sample coefficient of determination
pub type AccuracyRecord = BTreeMap<Quantity, f64>;

/// Quantity name -> feature name -> normalised importance
pub type ImportanceRecord = BTreeMap<Quantity, BTreeMap<String, f64>>;

/// Hyper-parameters for every model in the bank
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelBankConfig {
    pub air_quality_trees: usize,
    pub temperature_trees: usize,
    pub risk_trees: usize,
    pub anomaly_estimators: usize,
    /// Expected outlier fraction used to calibrate the anomaly threshold
    pub contamination: f64,
    /// `None` grows trees to full depth
    pub max_depth: Option<u16>,
    pub seed: u64,
}

impl Default for ModelBankConfig {
    fn default() -> Self {
        Self {
            air_quality_trees: 100,
            temperature_trees: 100,
            risk_trees: 150,
            anomaly_estimators: 100,
            contamination: 0.1,
            max_depth: None,
            seed: 42,
        }
    }
}

impl ModelBankConfig {
    fn trees_for(&self, quantity: Quantity) -> usize {
        match quantity {
            Quantity::AirQuality => self.air_quality_trees,
            Quantity::Temperature => self.temperature_trees,
            Quantity::RiskPredictor => self.risk_trees,
            Quantity::AnomalyDetector => self.anomaly_estimators,
        }
    }
}

/// Outcome of running the anomaly detector on one row
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnomalyVerdict {
    pub is_outlier: bool,
    /// Decision-function value; negative means outlier
    pub score: f64,
}

#[derive(Debug)]
struct RegressorEntry {
    model: SmartcoreRandomForest,
    scaler: StandardScaler,
}

/// Trained models plus their accuracy and feature-importance records
#[derive(Debug)]
pub struct ModelBank {
    regressors: BTreeMap<Quantity, RegressorEntry>,
    anomaly_detector: IsolationForest,
    accuracy: AccuracyRecord,
    importance: ImportanceRecord,
    training_samples: usize,
    trained_at: DateTime<Utc>,
}

impl ModelBank {
    /// Fit every model against the corpus
    ///
    /// Any failure aborts training; there is no partial bank.
    pub fn train(corpus: &TrainingCorpus, config: &ModelBankConfig) -> Result<Self> {
        let x = corpus.feature_matrix();
        info!(samples = corpus.len(), "training model bank");

        let mut regressors = BTreeMap::new();
        let mut accuracy = AccuracyRecord::new();
        let mut importance = ImportanceRecord::new();

        for quantity in Quantity::REGRESSORS {
            let y = match quantity {
                Quantity::AirQuality => corpus.air_quality_targets(),
                Quantity::Temperature => corpus.temperature_targets(),
                _ => corpus.risk_targets(),
            };

            let scaler = StandardScaler::fit(&x)
                .with_context(|| format!("fitting {quantity} scaler"))?;
            let x_scaled = scaler.transform(&x)?;

            let params = SmartcoreRandomForest::parameters(
                config.trees_for(quantity),
                config.max_depth,
                N_FEATURES,
                config.seed,
            );
            let model = SmartcoreRandomForest::train(&x_scaled, &y, params)
                .with_context(|| format!("training {quantity} model"))?;

            let fitted = model.predict(&x_scaled)?;
            let metrics = regression_metrics(&fitted, &y)?;
            let weights =
                permutation_importance(&model, &x_scaled, &y, &FEATURE_NAMES, config.seed)
                    .with_context(|| format!("computing {quantity} feature importance"))?;

            info!(
                model = %quantity,
                trees = model.n_trees,
                r2 = metrics.r2,
                mae = metrics.mae,
                rmse = metrics.rmse,
                "model trained"
            );
            debug!(model = %quantity, importance = ?weights, "feature importance");

            accuracy.insert(quantity, metrics.r2);
            importance.insert(quantity, weights);
            regressors.insert(quantity, RegressorEntry { model, scaler });
        }

        let mut anomaly_detector = IsolationForest::new()
            .with_n_estimators(config.anomaly_estimators)
            .with_contamination(config.contamination)
            .with_random_state(config.seed);
        anomaly_detector
            .fit(&x)
            .context("training anomaly detector")?;
        info!(
            estimators = config.anomaly_estimators,
            offset = anomaly_detector.offset(),
            "anomaly detector trained"
        );

        Ok(Self {
            regressors,
            anomaly_detector,
            accuracy,
            importance,
            training_samples: corpus.len(),
            trained_at: Utc::now(),
        })
    }

    /// Predict a regressor quantity for one resolved observation
    pub fn predict(&self, quantity: Quantity, row: &FeatureRow) -> Result<f64> {
        let entry = self
            .regressors
            .get(&quantity)
            .ok_or_else(|| anyhow::anyhow!("No regressor for {quantity}"))?;
        let scaled = entry.scaler.transform_row(&row.to_vec())?;
        entry
            .model
            .predict(&[scaled])?
            .first()
            .copied()
            .ok_or_else(|| anyhow::anyhow!("{quantity} model returned no prediction"))
    }

    /// Run the anomaly detector on unscaled features
    pub fn detect_anomaly(&self, row: &FeatureRow) -> Result<AnomalyVerdict> {
        let score = self
            .anomaly_detector
            .decision_function(&[row.to_vec()])?
            .first()
            .copied()
            .ok_or_else(|| anyhow::anyhow!("anomaly detector returned no score"))?;
        Ok(AnomalyVerdict {
            is_outlier: score < 0.0,
            score,
        })
    }

    pub fn accuracy(&self, quantity: Quantity) -> Option<f64> {
        self.accuracy.get(&quantity).copied()
    }

    pub fn accuracies(&self) -> &AccuracyRecord {
        &self.accuracy
    }

    pub fn feature_importance(&self) -> &ImportanceRecord {
        &self.importance
    }

    pub fn training_samples(&self) -> usize {
        self.training_samples
    }

    pub fn trained_at(&self) -> DateTime<Utc> {
        self.trained_at
    }

    /// Names of every model in the bank, detector included
    pub fn model_names(&self) -> Vec<Quantity> {
        self.regressors
            .keys()
            .copied()
            .chain(
                self.anomaly_detector
                    .is_fitted()
                    .then_some(Quantity::AnomalyDetector),
            )
            .collect()
    }

    pub fn model_count(&self) -> usize {
        self.model_names().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::{CorpusSource, SyntheticCorpus, SyntheticCorpusConfig};

    fn small_corpus() -> TrainingCorpus {
        SyntheticCorpus::new(SyntheticCorpusConfig {
            samples: 300,
            ..Default::default()
        })
        .load()
        .unwrap()
    }

    fn small_config() -> ModelBankConfig {
        ModelBankConfig {
            air_quality_trees: 8,
            temperature_trees: 8,
            risk_trees: 10,
            anomaly_estimators: 30,
            ..Default::default()
        }
    }

    fn small_bank() -> ModelBank {
        ModelBank::train(&small_corpus(), &small_config()).unwrap()
    }

    #[test]
    fn test_default_config() {
        let cfg = ModelBankConfig::default();
        assert_eq!(cfg.trees_for(Quantity::AirQuality), 100);
        assert_eq!(cfg.trees_for(Quantity::RiskPredictor), 150);
        assert_eq!(cfg.contamination, 0.1);
        assert_eq!(cfg.seed, 42);
        assert_eq!(cfg.max_depth, None);
    }

    #[test]
    fn test_bank_records() {
        let bank = small_bank();
        assert_eq!(bank.training_samples(), 300);
        assert_eq!(bank.model_count(), 4);
        assert_eq!(
            bank.model_names(),
            vec![
                Quantity::AirQuality,
                Quantity::Temperature,
                Quantity::RiskPredictor,
                Quantity::AnomalyDetector,
            ]
        );

        assert_eq!(bank.accuracies().len(), 3);
        for q in Quantity::REGRESSORS {
            let r2 = bank.accuracy(q).unwrap();
            assert!(r2 <= 1.0 && r2 > 0.5, "{q} r2 = {r2}");

            let weights = &bank.feature_importance()[&q];
            assert_eq!(weights.len(), N_FEATURES);
            assert!(weights.values().all(|w| *w >= 0.0));
            assert!((weights.values().sum::<f64>() - 1.0).abs() < 1e-9);
        }
        assert!(bank.accuracy(Quantity::AnomalyDetector).is_none());
    }

    #[test]
    fn test_predict_is_deterministic() {
        let bank = small_bank();
        let row = FeatureRow {
            temperature: 25.0,
            humidity: 55.0,
            wind_speed: 3.0,
            pressure: 1010.0,
            day_of_year: 180,
            hour_of_day: 14,
            is_weekend: false,
        };
        let a = bank.predict(Quantity::Temperature, &row).unwrap();
        let b = bank.predict(Quantity::Temperature, &row).unwrap();
        assert_eq!(a.to_bits(), b.to_bits());
        assert!(bank.predict(Quantity::AnomalyDetector, &row).is_err());
    }

    #[test]
    fn test_gross_outlier_is_flagged() {
        let bank = small_bank();
        let row = FeatureRow {
            temperature: 55.0,
            humidity: 0.0,
            wind_speed: 90.0,
            pressure: 850.0,
            day_of_year: 200,
            hour_of_day: 3,
            is_weekend: true,
        };
        let verdict = bank.detect_anomaly(&row).unwrap();
        assert!(verdict.is_outlier);
        assert!(verdict.score < 0.0);
    }

    #[test]
    fn test_anomaly_detector_sees_raw_features() {
        let corpus = small_corpus();
        let config = small_config();
        let bank = ModelBank::train(&corpus, &config).unwrap();

        let mut reference = IsolationForest::new()
            .with_n_estimators(config.anomaly_estimators)
            .with_contamination(config.contamination)
            .with_random_state(config.seed);
        reference.fit(&corpus.feature_matrix()).unwrap();

        let rows = [
            FeatureRow {
                temperature: 18.0,
                humidity: 65.0,
                wind_speed: 4.0,
                pressure: 1012.0,
                day_of_year: 90,
                hour_of_day: 9,
                is_weekend: false,
            },
            FeatureRow {
                temperature: -40.0,
                humidity: 5.0,
                wind_speed: 60.0,
                pressure: 900.0,
                day_of_year: 10,
                hour_of_day: 23,
                is_weekend: true,
            },
        ];
        for row in rows {
            let expected = reference.decision_function(&[row.to_vec()]).unwrap()[0];
            let verdict = bank.detect_anomaly(&row).unwrap();
            assert_eq!(verdict.score.to_bits(), expected.to_bits());
            assert_eq!(verdict.is_outlier, expected < 0.0);
        }
    }
}

#![allow(dead_code)]
//! Shared fixtures: one small trained model bank reused by every test

use std::sync::Arc;

use eco_sentinel::config::Config;
use eco_sentinel::engine::InferenceEngine;
use eco_sentinel::insights::NarrativeGenerator;
use eco_sentinel::ml::{ModelBank, ModelBankConfig};
use eco_sentinel::simulation::{CorpusSource, SyntheticCorpus, SyntheticCorpusConfig};
use eco_sentinel::state::AppState;
use once_cell::sync::Lazy;

pub const TEST_SAMPLES: usize = 600;

pub fn test_bank_config() -> ModelBankConfig {
    ModelBankConfig {
        air_quality_trees: 10,
        temperature_trees: 10,
        risk_trees: 15,
        anomaly_estimators: 50,
        ..Default::default()
    }
}

static BANK: Lazy<Arc<ModelBank>> = Lazy::new(|| {
    let corpus = SyntheticCorpus::new(SyntheticCorpusConfig {
        samples: TEST_SAMPLES,
        ..Default::default()
    })
    .load()
    .expect("corpus");
    Arc::new(ModelBank::train(&corpus, &test_bank_config()).expect("model bank"))
});

pub fn bank() -> Arc<ModelBank> {
    Arc::clone(&BANK)
}

pub fn engine_with(narrator: NarrativeGenerator) -> Arc<InferenceEngine> {
    Arc::new(InferenceEngine::new(bank(), narrator))
}

pub fn offline_engine() -> Arc<InferenceEngine> {
    engine_with(NarrativeGenerator::offline())
}

pub fn app_state(engine: Arc<InferenceEngine>) -> AppState {
    AppState::with_engine(Config::default(), engine).expect("app state")
}

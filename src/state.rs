use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use crate::api::metrics::ApiMetrics;
use crate::cache::{MemoryCache, ResponseCache};
use crate::config::Config;
use crate::engine::InferenceEngine;
use crate::insights::NarrativeGenerator;
use crate::simulation::SyntheticCorpus;

/// Shared handles passed to every request handler
#[derive(Clone)]
pub struct AppState {
    pub cfg: Arc<Config>,
    pub engine: Arc<InferenceEngine>,
    pub cache: Arc<dyn ResponseCache>,
    pub metrics: Arc<ApiMetrics>,
}

impl AppState {
    /// Train the engine on a blocking thread and wire up the collaborators
    pub async fn new(cfg: Config) -> Result<Self> {
        let corpus = SyntheticCorpus::new(cfg.engine.corpus_config());
        let bank_config = cfg.engine.bank_config();
        let narrator = NarrativeGenerator::from_config(&cfg.llm);

        info!(
            samples = cfg.engine.training_samples,
            llm = narrator.is_configured(),
            "bootstrapping inference engine"
        );
        let engine = tokio::task::spawn_blocking(move || {
            InferenceEngine::bootstrap(&corpus, &bank_config, narrator)
        })
        .await
        .context("training task panicked")??;

        Self::with_engine(cfg, Arc::new(engine))
    }

    /// Wire an already-built engine
    pub fn with_engine(cfg: Config, engine: Arc<InferenceEngine>) -> Result<Self> {
        let metrics = ApiMetrics::new().context("registering metrics")?;
        for r2 in engine.bank().accuracies().values() {
            metrics.observe_accuracy(*r2);
        }
        let cache = MemoryCache::new(cfg.cache.max_entries);

        Ok(Self {
            cfg: Arc::new(cfg),
            engine,
            cache: Arc::new(cache),
            metrics: Arc::new(metrics),
        })
    }
}

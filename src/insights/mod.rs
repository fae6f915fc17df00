//! Narrative insight generation
//!
//! Two tiers: a language-model narrative when the text-generation dependency
//! answers in time, otherwise a deterministic rule-based narrative. Every
//! dependency failure degrades to the fallback; only a local failure while
//! building the prompt is reported to the caller.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, warn};

pub mod fallback;
pub mod llm;
pub mod prompt;

pub use fallback::fallback_narrative;
pub use llm::{ChatRequest, GenerationError, OpenAiClient, TextGenerator};
pub use prompt::{build_prompt, SYSTEM_PROMPT};

use crate::config::LlmConfig;
use crate::domain::{InsightInput, InsightResult};

#[derive(Debug, Error)]
pub enum InsightError {
    #[error("could not build prompt: {0}")]
    Prompt(String),
}

/// Produces narratives, falling back to rules when the generator fails
#[derive(Clone)]
pub struct NarrativeGenerator {
    generator: Option<Arc<dyn TextGenerator>>,
    timeout: Duration,
    max_tokens: u32,
    temperature: f32,
}

impl NarrativeGenerator {
    pub fn new(generator: Option<Arc<dyn TextGenerator>>, timeout: Duration) -> Self {
        Self {
            generator,
            timeout,
            max_tokens: 800,
            temperature: 0.3,
        }
    }

    /// Rule-based only
    pub fn offline() -> Self {
        Self::new(None, Duration::from_secs(30))
    }

    /// Build from configuration; without an API key only the fallback is used
    pub fn from_config(cfg: &LlmConfig) -> Self {
        let timeout = Duration::from_secs(cfg.timeout_secs);
        let generator = match cfg.api_key.as_deref().filter(|k| !k.trim().is_empty()) {
            Some(key) => match OpenAiClient::new(&cfg.endpoint, &cfg.model, key, timeout) {
                Ok(client) => Some(Arc::new(client) as Arc<dyn TextGenerator>),
                Err(e) => {
                    warn!(
                        error = %e,
                        "text generation client unavailable; using rule-based insights"
                    );
                    None
                }
            },
            None => {
                warn!("no API key configured; using rule-based insights");
                None
            }
        };
        Self {
            generator,
            timeout,
            max_tokens: cfg.max_tokens,
            temperature: cfg.temperature,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.generator.is_some()
    }

    /// Produce a narrative for `input`
    pub async fn generate(&self, input: &InsightInput) -> Result<InsightResult, InsightError> {
        self.narrate(input, input.field_count()).await
    }

    /// Produce a narrative for `input`, rating data quality on
    /// `supplied_fields` rather than on the (possibly enriched) prompt input
    pub async fn narrate(
        &self,
        input: &InsightInput,
        supplied_fields: usize,
    ) -> Result<InsightResult, InsightError> {
        let user = build_prompt(input)?;
        let request = ChatRequest {
            system: SYSTEM_PROMPT.to_string(),
            user,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };

        match self.call(&request).await {
            Ok(text) => {
                debug!(chars = text.len(), "language model narrative generated");
                Ok(InsightResult::from_llm(text, supplied_fields))
            }
            Err(e) => {
                warn!(
                    kind = e.kind(),
                    error = %e,
                    "insight generation failed; using rule-based fallback"
                );
                Ok(InsightResult::from_rules(fallback_narrative(input)))
            }
        }
    }

    async fn call(&self, request: &ChatRequest) -> Result<String, GenerationError> {
        let generator = self
            .generator
            .as_ref()
            .ok_or(GenerationError::NotConfigured)?;
        let text = tokio::time::timeout(self.timeout, generator.generate(request))
            .await
            .map_err(|_| GenerationError::Timeout)??;
        if text.trim().is_empty() {
            return Err(GenerationError::Malformed("empty narrative".into()));
        }
        Ok(text)
    }
}

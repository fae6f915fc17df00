use anyhow::Result;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::time::Duration;

use crate::insights::llm::DEFAULT_OPENAI_ENDPOINT;
use crate::ml::ModelBankConfig;
use crate::simulation::SyntheticCorpusConfig;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub engine: EngineConfig,
    pub llm: LlmConfig,
    pub cache: CacheConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub request_timeout_seconds: u64,
    pub enable_cors: bool,
    pub cors_allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
            request_timeout_seconds: 60,
            enable_cors: false,
            cors_allowed_origins: Vec::new(),
        }
    }
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        Ok(format!("{}:{}", self.host, self.port).parse()?)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }
}

/// Training corpus size and model hyper-parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    pub training_samples: usize,
    pub seed: u64,
    pub air_quality_trees: usize,
    pub temperature_trees: usize,
    pub risk_trees: usize,
    pub anomaly_estimators: usize,
    pub contamination: f64,
    pub max_depth: Option<u16>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        let bank = ModelBankConfig::default();
        Self {
            training_samples: SyntheticCorpusConfig::default().samples,
            seed: bank.seed,
            air_quality_trees: bank.air_quality_trees,
            temperature_trees: bank.temperature_trees,
            risk_trees: bank.risk_trees,
            anomaly_estimators: bank.anomaly_estimators,
            contamination: bank.contamination,
            max_depth: bank.max_depth,
        }
    }
}

impl EngineConfig {
    pub fn corpus_config(&self) -> SyntheticCorpusConfig {
        SyntheticCorpusConfig {
            samples: self.training_samples,
            seed: self.seed,
            ..Default::default()
        }
    }

    pub fn bank_config(&self) -> ModelBankConfig {
        ModelBankConfig {
            air_quality_trees: self.air_quality_trees,
            temperature_trees: self.temperature_trees,
            risk_trees: self.risk_trees,
            anomaly_estimators: self.anomaly_estimators,
            contamination: self.contamination,
            max_depth: self.max_depth,
            seed: self.seed,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    pub endpoint: String,
    pub model: String,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_OPENAI_ENDPOINT.to_string(),
            model: "gpt-4".to_string(),
            api_key: None,
            timeout_secs: 30,
            max_tokens: 800,
            temperature: 0.3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    pub prediction_ttl_seconds: u64,
    pub insight_ttl_seconds: u64,
    pub max_entries: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            prediction_ttl_seconds: 300,
            insight_ttl_seconds: 1800,
            max_entries: 10_000,
        }
    }
}

impl CacheConfig {
    pub fn prediction_ttl(&self) -> Duration {
        Duration::from_secs(self.prediction_ttl_seconds)
    }

    pub fn insight_ttl(&self) -> Duration {
        Duration::from_secs(self.insight_ttl_seconds)
    }
}

impl Config {
    /// Defaults, then `config/default.toml`, then the environment
    pub fn figment() -> Figment {
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file("config/default.toml"))
            .merge(Env::prefixed("ECO__").split("__"))
            .merge(
                Env::raw()
                    .only(&["OPENAI_API_KEY"])
                    .map(|_| "llm.api_key".into()),
            )
            .merge(
                Env::raw()
                    .only(&["AI_SERVICE_PORT"])
                    .map(|_| "server.port".into()),
            )
    }

    pub fn load() -> Result<Self> {
        Ok(Self::figment().extract()?)
    }
}

//! EcoSentinel environmental-conditions inference engine
//!
//! Trains a bank of models on a bootstrap corpus at startup, then serves
//! air-quality, temperature and risk predictions, anomaly verdicts, and
//! narrative insights over HTTP.

pub mod api;
pub mod cache;
pub mod config;
pub mod domain;
pub mod engine;
pub mod insights;
pub mod ml;
pub mod simulation;
pub mod state;
pub mod telemetry;

//! Simulated data sources used to bootstrap the models

pub mod corpus;

pub use corpus::*;

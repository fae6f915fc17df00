//! # Synthetic Training Corpus
//!
//! Bootstrap data source used when no historical measurements are available.
//! Produces hourly samples with seasonal and diurnal cycles plus bounded
//! random noise, labelled with a ground-truth AQI and composite risk score.
//!
//! The corpus is fabricated, not measured. A historical source plugs in as
//! another [`CorpusSource`] implementation.

use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, PI, TAU};

use anyhow::{Context, Result};
use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, Timelike};
use rand::{rngs::StdRng, SeedableRng};
use rand_distr::{Distribution, Exp, Normal};
use serde::{Deserialize, Serialize};

use crate::domain::{is_weekend_day, FeatureRow};

/// One labelled training sample
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CorpusSample {
    pub timestamp: NaiveDateTime,
    pub features: FeatureRow,
    /// Ground-truth air-quality index (0-500)
    pub air_quality: f64,
    /// Ground-truth composite risk score (0-100)
    pub risk_score: f64,
}

/// Ordered, immutable set of labelled samples the model bank trains on
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingCorpus {
    samples: Vec<CorpusSample>,
}

impl TrainingCorpus {
    pub fn new(samples: Vec<CorpusSample>) -> Result<Self> {
        if samples.is_empty() {
            anyhow::bail!("Training corpus must contain at least one sample");
        }
        Ok(Self { samples })
    }

    pub fn samples(&self) -> &[CorpusSample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Feature matrix, one row per sample in `FEATURE_NAMES` order
    pub fn feature_matrix(&self) -> Vec<Vec<f64>> {
        self.samples.iter().map(|s| s.features.to_vec()).collect()
    }

    pub fn air_quality_targets(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.air_quality).collect()
    }

    pub fn temperature_targets(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.features.temperature).collect()
    }

    pub fn risk_targets(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.risk_score).collect()
    }
}

/// Anything able to produce a training corpus
pub trait CorpusSource: Send + Sync {
    fn load(&self) -> Result<TrainingCorpus>;
}

/// Synthetic generator configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyntheticCorpusConfig {
    /// Number of hourly samples
    pub samples: usize,
    /// RNG seed; the same seed always yields the same corpus
    pub seed: u64,
    /// Timestamp of the first sample
    pub start_time: NaiveDateTime,
}

impl Default for SyntheticCorpusConfig {
    fn default() -> Self {
        Self {
            samples: 10_000,
            seed: 42,
            start_time: NaiveDate::from_ymd_opt(2020, 1, 1)
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .unwrap_or_default(),
        }
    }
}

/// Seasonal/diurnal synthetic corpus generator
#[derive(Debug, Clone, Default)]
pub struct SyntheticCorpus {
    config: SyntheticCorpusConfig,
}

impl SyntheticCorpus {
    pub fn new(config: SyntheticCorpusConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SyntheticCorpusConfig {
        &self.config
    }

    /// Generate the corpus
    ///
    /// Noise is drawn column by column from a single seeded RNG so that the
    /// output depends only on the seed and the sample count.
    pub fn generate(&self) -> Result<TrainingCorpus> {
        let n = self.config.samples;
        if n == 0 {
            anyhow::bail!("Synthetic corpus sample count must be positive");
        }

        let mut rng = StdRng::seed_from_u64(self.config.seed);
        let temperature_noise = Normal::new(0.0, 2.0).context("temperature noise")?;
        let humidity_noise = Normal::new(0.0, 5.0).context("humidity noise")?;
        let wind_noise = Exp::new(0.5).context("wind noise")?; // mean 2 m/s
        let pressure_noise = Normal::new(0.0, 5.0).context("pressure noise")?;
        let aqi_noise = Normal::new(0.0, 10.0).context("air quality noise")?;

        let temperature_eps = draw(&mut rng, &temperature_noise, n);
        let humidity_eps = draw(&mut rng, &humidity_noise, n);
        let wind_eps = draw(&mut rng, &wind_noise, n);
        let pressure_eps = draw(&mut rng, &pressure_noise, n);
        let aqi_eps = draw(&mut rng, &aqi_noise, n);

        let samples = (0..n)
            .map(|i| {
                let timestamp = self.config.start_time + Duration::hours(i as i64);
                let day_of_year = timestamp.ordinal();
                let hour_of_day = timestamp.hour();
                let season = TAU * f64::from(day_of_year) / 365.0;
                let diurnal = TAU * f64::from(hour_of_day) / 24.0;

                let temperature =
                    20.0 + 10.0 * season.sin() + 5.0 * diurnal.sin() + temperature_eps[i];
                let humidity = 60.0
                    + 20.0 * (season + FRAC_PI_4).sin()
                    + 10.0 * (diurnal + PI).sin()
                    + humidity_eps[i];
                let wind_speed = 5.0 + 3.0 * (season + FRAC_PI_2).sin() + wind_eps[i];
                let pressure = 1013.0 + 10.0 * season.sin() + pressure_eps[i];

                let air_quality = (50.0
                    + 30.0 / (wind_speed + 1.0)
                    + 20.0 * (diurnal + PI).sin()
                    + aqi_eps[i])
                    .clamp(0.0, 500.0);
                let risk_score = risk_label(air_quality, temperature, humidity, wind_speed);

                CorpusSample {
                    timestamp,
                    features: FeatureRow {
                        temperature,
                        humidity,
                        wind_speed,
                        pressure,
                        day_of_year,
                        hour_of_day,
                        is_weekend: is_weekend_day(timestamp.weekday()),
                    },
                    air_quality,
                    risk_score,
                }
            })
            .collect();

        TrainingCorpus::new(samples)
    }
}

impl CorpusSource for SyntheticCorpus {
    fn load(&self) -> Result<TrainingCorpus> {
        self.generate()
    }
}

fn draw<D: Distribution<f64>>(rng: &mut StdRng, dist: &D, n: usize) -> Vec<f64> {
    (0..n).map(|_| dist.sample(&mut *rng)).collect()
}

/// Ground-truth composite risk: weighted sum, scaled to 0-100 and clamped
pub fn risk_label(air_quality: f64, temperature: f64, humidity: f64, wind_speed: f64) -> f64 {
    let weighted = 0.4 * (air_quality / 100.0)
        + 0.3 * ((temperature - 22.0).abs() / 30.0)
        + 0.2 * (humidity / 100.0)
        + 0.1 * (1.0 / (wind_speed + 1.0));
    (weighted * 100.0).clamp(0.0, 100.0)
}

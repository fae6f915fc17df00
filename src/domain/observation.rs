//! Environmental observations and the fixed model feature layout

use chrono::{DateTime, Datelike, TimeZone, Timelike, Weekday};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Default ambient temperature (°C) used when a reading is missing
pub const DEFAULT_TEMPERATURE_C: f64 = 22.0;
/// Default relative humidity (%)
pub const DEFAULT_HUMIDITY_PERCENT: f64 = 60.0;
/// Default wind speed (m/s)
pub const DEFAULT_WIND_SPEED_MS: f64 = 5.0;
/// Default barometric pressure (hPa)
pub const DEFAULT_PRESSURE_HPA: f64 = 1013.0;

/// Model input columns, in the order every scaler and model expects them
pub const FEATURE_NAMES: [&str; 7] = [
    "temperature",
    "humidity",
    "wind_speed",
    "pressure",
    "day_of_year",
    "hour_of_day",
    "is_weekend",
];

/// Number of model input columns
pub const N_FEATURES: usize = FEATURE_NAMES.len();

/// A (possibly partial) set of environmental readings
///
/// Every field is optional; missing readings are filled with documented
/// defaults when the observation is resolved into a [`FeatureRow`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct Observation {
    /// Air temperature (°C)
    #[validate(range(min = -90.0, max = 60.0))]
    pub temperature: Option<f64>,
    /// Relative humidity (%)
    #[validate(range(min = 0.0, max = 100.0))]
    pub humidity: Option<f64>,
    /// Wind speed (m/s)
    #[validate(range(min = 0.0, max = 120.0))]
    pub wind_speed: Option<f64>,
    /// Barometric pressure (hPa)
    #[validate(range(min = 800.0, max = 1200.0))]
    pub pressure: Option<f64>,
    /// Day of year (1-366)
    #[validate(range(min = 1, max = 366))]
    pub day_of_year: Option<u32>,
    /// Hour of day (0-23)
    #[validate(range(max = 23))]
    pub hour_of_day: Option<u32>,
    /// Saturday or Sunday
    pub is_weekend: Option<bool>,
}

impl Observation {
    /// Fill missing readings from defaults and `now` (calendar fields)
    pub fn resolve<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> FeatureRow {
        FeatureRow {
            temperature: self.temperature.unwrap_or(DEFAULT_TEMPERATURE_C),
            humidity: self.humidity.unwrap_or(DEFAULT_HUMIDITY_PERCENT),
            wind_speed: self.wind_speed.unwrap_or(DEFAULT_WIND_SPEED_MS),
            pressure: self.pressure.unwrap_or(DEFAULT_PRESSURE_HPA),
            day_of_year: self.day_of_year.unwrap_or_else(|| now.ordinal()),
            hour_of_day: self.hour_of_day.unwrap_or_else(|| now.hour()),
            is_weekend: self
                .is_weekend
                .unwrap_or_else(|| is_weekend_day(now.weekday())),
        }
    }

    /// Number of readings actually supplied
    pub fn supplied_fields(&self) -> usize {
        [
            self.temperature.is_some(),
            self.humidity.is_some(),
            self.wind_speed.is_some(),
            self.pressure.is_some(),
            self.day_of_year.is_some(),
            self.hour_of_day.is_some(),
            self.is_weekend.is_some(),
        ]
        .into_iter()
        .filter(|present| *present)
        .count()
    }
}

/// Saturday and Sunday count as weekend
pub fn is_weekend_day(weekday: Weekday) -> bool {
    matches!(weekday, Weekday::Sat | Weekday::Sun)
}

/// A fully-resolved observation, ready to be fed to the models
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureRow {
    pub temperature: f64,
    pub humidity: f64,
    pub wind_speed: f64,
    pub pressure: f64,
    pub day_of_year: u32,
    pub hour_of_day: u32,
    pub is_weekend: bool,
}

impl FeatureRow {
    /// Feature values in [`FEATURE_NAMES`] order
    pub fn to_vec(&self) -> Vec<f64> {
        vec![
            self.temperature,
            self.humidity,
            self.wind_speed,
            self.pressure,
            f64::from(self.day_of_year),
            f64::from(self.hour_of_day),
            if self.is_weekend { 1.0 } else { 0.0 },
        ]
    }
}

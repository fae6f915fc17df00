//! Prompt construction for the language-model narrative path

use super::InsightError;
use crate::domain::InsightInput;

pub const SYSTEM_PROMPT: &str = "You are an expert environmental scientist and AI analyst \
specializing in climate data interpretation and public health recommendations.";

const MISSING: &str = "N/A";

fn reading(name: &str, value: Option<f64>) -> Result<String, InsightError> {
    match value {
        Some(v) if !v.is_finite() => Err(InsightError::Prompt(format!(
            "{name} must be a finite number, got {v}"
        ))),
        Some(v) => Ok(v.to_string()),
        None => Ok(MISSING.to_string()),
    }
}

/// Build the user prompt for one insight request
///
/// Fails only on values that cannot be rendered (non-finite numbers).
pub fn build_prompt(input: &InsightInput) -> Result<String, InsightError> {
    let air_quality = reading("air_quality", input.air_quality)?;
    let temperature = reading("temperature", input.temperature)?;
    let humidity = reading("humidity", input.humidity)?;
    let wind_speed = reading("wind_speed", input.wind_speed)?;
    let location = input
        .location
        .as_deref()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .unwrap_or(MISSING);

    Ok(format!(
        "Environmental Data Analysis:
- Air Quality Index: {air_quality}
- Temperature: {temperature}°C
- Humidity: {humidity}%
- Wind Speed: {wind_speed} m/s
- Location: {location}

Please provide:
1. A brief summary of current environmental conditions
2. Key insights and patterns
3. Actionable recommendations for improvement
4. Potential health impacts
5. Short-term predictions (24-48 hours)

Keep the response professional, accurate, and actionable."
    ))
}

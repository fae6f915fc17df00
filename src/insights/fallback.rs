//! Deterministic rule-based narrative used when text generation is unavailable

use itertools::Itertools;

use crate::domain::{InsightInput, DEFAULT_TEMPERATURE_C};

/// AQI assumed when the input carries none
const FALLBACK_AQI: f64 = 50.0;
const CONCERNING_AQI: f64 = 100.0;
const HOT_TEMPERATURE_C: f64 = 30.0;
const COLD_TEMPERATURE_C: f64 = 5.0;

/// Build the fallback narrative for an insight input
pub fn fallback_narrative(input: &InsightInput) -> String {
    let mut insights = Vec::new();
    let mut recommendations = Vec::new();

    let aqi = input.air_quality.unwrap_or(FALLBACK_AQI);
    if aqi > CONCERNING_AQI {
        insights.push(format!("Air quality is concerning with AQI of {aqi}"));
        recommendations.push("Limit outdoor activities, especially for sensitive individuals");
    }

    let temperature = input.temperature.unwrap_or(DEFAULT_TEMPERATURE_C);
    if temperature > HOT_TEMPERATURE_C {
        insights.push("High temperature conditions detected".to_string());
        recommendations.push("Stay hydrated and avoid prolonged sun exposure");
    } else if temperature < COLD_TEMPERATURE_C {
        insights.push("Cold weather conditions present".to_string());
        recommendations.push("Dress warmly and be aware of potential health risks");
    }

    if insights.is_empty() {
        insights.push("Environmental conditions are within normal ranges".to_string());
        recommendations.push("No special precautions are needed");
    }

    format!(
        "Analysis: {}. Recommendations: {}",
        insights.iter().join("; "),
        recommendations.iter().join("; ")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_poor_air_and_heat() {
        let input = InsightInput {
            air_quality: Some(120.0),
            temperature: Some(32.0),
            ..Default::default()
        };
        assert_eq!(
            fallback_narrative(&input),
            "Analysis: Air quality is concerning with AQI of 120; High temperature conditions detected. \
             Recommendations: Limit outdoor activities, especially for sensitive individuals; \
             Stay hydrated and avoid prolonged sun exposure"
        );
    }

    #[test]
    fn test_cold() {
        let input = InsightInput {
            temperature: Some(-3.0),
            ..Default::default()
        };
        let text = fallback_narrative(&input);
        assert!(text.contains("Cold weather conditions present"));
        assert!(text.contains("Dress warmly and be aware of potential health risks"));
        assert!(!text.contains("Air quality is concerning"));
    }

    #[rstest]
    #[case(Some(100.0), Some(30.0))]
    #[case(None, None)]
    #[case(Some(50.0), Some(5.0))]
    fn test_no_rule_triggers(#[case] aqi: Option<f64>, #[case] temp: Option<f64>) {
        let input = InsightInput {
            air_quality: aqi,
            temperature: temp,
            ..Default::default()
        };
        assert_eq!(
            fallback_narrative(&input),
            "Analysis: Environmental conditions are within normal ranges. \
             Recommendations: No special precautions are needed"
        );
    }
}

//! Training-time evaluation: goodness of fit and feature importance
//!
//! All figures are computed in-sample, against the data the model was
//! fitted on.

use std::collections::BTreeMap;

use anyhow::Result;
use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

use super::{Regressor, ValidationMetrics};

/// Calculate MAE, RMSE and R² of predictions against targets
pub fn regression_metrics(predictions: &[f64], targets: &[f64]) -> Result<ValidationMetrics> {
    if predictions.len() != targets.len() {
        anyhow::bail!("Prediction and target count mismatch");
    }

    if predictions.is_empty() {
        anyhow::bail!("No predictions to evaluate");
    }

    let n = predictions.len() as f64;

    let mae: f64 = predictions
        .iter()
        .zip(targets.iter())
        .map(|(p, t)| (p - t).abs())
        .sum::<f64>()
        / n;

    let mse: f64 = predictions
        .iter()
        .zip(targets.iter())
        .map(|(p, t)| (p - t).powi(2))
        .sum::<f64>()
        / n;
    let rmse = mse.sqrt();

    Ok(ValidationMetrics::new(mae, rmse, r2_score(predictions, targets)))
}

/// Coefficient of determination
///
/// A constant target gives 1.0 for a perfect fit and 0.0 otherwise.
pub fn r2_score(predictions: &[f64], targets: &[f64]) -> f64 {
    let n = targets.len() as f64;
    let mean_target: f64 = targets.iter().sum::<f64>() / n;
    let ss_tot: f64 = targets.iter().map(|t| (t - mean_target).powi(2)).sum();
    let ss_res: f64 = predictions
        .iter()
        .zip(targets.iter())
        .map(|(p, t)| (t - p).powi(2))
        .sum();

    if ss_tot.abs() < 1e-10 {
        if ss_res.abs() < 1e-10 {
            1.0
        } else {
            0.0
        }
    } else {
        1.0 - (ss_res / ss_tot)
    }
}

/// Permutation feature importance, normalised to sum to 1
///
/// Each column is shuffled in turn (seeded), and the resulting drop in R² is
/// that feature's raw importance. Negative drops count as zero. If no column
/// matters at all, every feature gets an equal share.
pub fn permutation_importance<R: Regressor + ?Sized>(
    model: &R,
    x: &[Vec<f64>],
    y: &[f64],
    feature_names: &[&str],
    seed: u64,
) -> Result<BTreeMap<String, f64>> {
    let n_features = feature_names.len();
    if x.iter().any(|row| row.len() != n_features) {
        anyhow::bail!("Feature name count does not match feature vector width");
    }

    let baseline = r2_score(&model.predict(x)?, y);
    let mut rng = StdRng::seed_from_u64(seed);

    let mut drops = Vec::with_capacity(n_features);
    for j in 0..n_features {
        let mut column: Vec<f64> = x.iter().map(|row| row[j]).collect();
        column.shuffle(&mut rng);

        let permuted: Vec<Vec<f64>> = x
            .iter()
            .zip(column)
            .map(|(row, value)| {
                let mut row = row.clone();
                row[j] = value;
                row
            })
            .collect();

        let score = r2_score(&model.predict(&permuted)?, y);
        drops.push((baseline - score).max(0.0));
    }

    let total: f64 = drops.iter().sum();
    let weights = drops.iter().map(|d| {
        if total > 0.0 {
            d / total
        } else {
            1.0 / n_features as f64
        }
    });

    Ok(feature_names
        .iter()
        .map(|name| name.to_string())
        .zip(weights)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// y = sum(coef_i * x_i)
    struct Linear(Vec<f64>);

    impl Regressor for Linear {
        fn predict(&self, rows: &[Vec<f64>]) -> Result<Vec<f64>> {
            Ok(rows
                .iter()
                .map(|r| r.iter().zip(&self.0).map(|(x, c)| x * c).sum())
                .collect())
        }
    }

    #[test]
    fn test_calculate_metrics() {
        let predictions = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let targets = vec![1.1, 2.1, 2.9, 4.2, 4.8];

        let metrics = regression_metrics(&predictions, &targets).unwrap();

        assert!(metrics.mae < 0.3);
        assert!(metrics.rmse < 0.4);
        assert!(metrics.r2 > 0.9);
    }

    #[test]
    fn test_perfect_fit_r2_is_one() {
        let y = vec![3.0, 1.0, 4.0, 1.0, 5.0];
        assert_eq!(r2_score(&y, &y), 1.0);
        // predicting the mean scores zero
        let mean = vec![2.8; 5];
        assert!(r2_score(&mean, &y).abs() < 1e-12);
    }

    #[test]
    fn test_metrics_reject_mismatch() {
        assert!(regression_metrics(&[1.0], &[1.0, 2.0]).is_err());
        assert!(regression_metrics(&[], &[]).is_err());
    }

    #[test]
    fn test_importance_prefers_informative_feature() {
        let x: Vec<Vec<f64>> = (0..200)
            .map(|i| vec![i as f64, ((i * 7) % 13) as f64])
            .collect();
        let model = Linear(vec![1.0, 0.0]);
        let y = model.predict(&x).unwrap();

        let imp = permutation_importance(&model, &x, &y, &["signal", "noise"], 42).unwrap();
        assert!(imp["signal"] > 0.99);
        assert_eq!(imp["noise"], 0.0);
        assert!((imp.values().sum::<f64>() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_importance_uniform_when_nothing_matters() {
        let x: Vec<Vec<f64>> = (0..20).map(|i| vec![i as f64, 1.0]).collect();
        let model = Linear(vec![0.0, 0.0]);
        let y = vec![0.0; 20];
        let imp = permutation_importance(&model, &x, &y, &["a", "b"], 1).unwrap();
        assert_eq!(imp["a"], 0.5);
        assert_eq!(imp["b"], 0.5);
    }
}

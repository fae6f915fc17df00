//! SmartCore RandomForest Regressor Wrapper
//!
//! Thin wrapper around SmartCore's `RandomForestRegressor` that validates
//! training data shape and converts row-major feature vectors to the
//! `DenseMatrix` layout SmartCore expects.

use anyhow::Result;
use smartcore::ensemble::random_forest_regressor::{
    RandomForestRegressor, RandomForestRegressorParameters,
};
use smartcore::linalg::basic::matrix::DenseMatrix;

use super::Regressor;

type Forest = RandomForestRegressor<f64, f64, DenseMatrix<f64>, Vec<f64>>;

/// Fitted SmartCore random forest
#[derive(Debug)]
pub struct SmartcoreRandomForest {
    model: Forest,
    /// Training parameters for reproducibility
    pub n_trees: usize,
    pub max_depth: Option<u16>,
    pub n_features: usize,
}

impl SmartcoreRandomForest {
    /// Forest parameters
    ///
    /// Trees are grown to full depth unless `max_depth` is given, and every
    /// feature is considered at each split (`m = n_features`).
    pub fn parameters(
        n_trees: usize,
        max_depth: Option<u16>,
        n_features: usize,
        seed: u64,
    ) -> RandomForestRegressorParameters {
        RandomForestRegressorParameters {
            max_depth,
            min_samples_leaf: 1,
            min_samples_split: 2,
            n_trees,
            m: Some(n_features),
            keep_samples: false, // Don't store training samples (saves memory)
            seed,
        }
    }

    /// Train a new RandomForest model
    pub fn train(
        x: &[Vec<f64>],
        y: &[f64],
        params: RandomForestRegressorParameters,
    ) -> Result<Self> {
        if x.is_empty() || y.is_empty() {
            anyhow::bail!("Cannot train on empty dataset");
        }

        if x.len() != y.len() {
            anyhow::bail!(
                "Feature and target count mismatch: {} features, {} targets",
                x.len(),
                y.len()
            );
        }

        if params.n_trees == 0 {
            anyhow::bail!("RandomForest needs at least one tree");
        }

        let n_trees = params.n_trees;
        let max_depth = params.max_depth;
        let n_features = x[0].len();
        let x_matrix = to_matrix(x, n_features)?;

        let model = Forest::fit(&x_matrix, &y.to_vec(), params)
            .map_err(|e| anyhow::anyhow!("RandomForest training failed: {:?}", e))?;

        Ok(Self {
            model,
            n_trees,
            max_depth,
            n_features,
        })
    }
}

impl Regressor for SmartcoreRandomForest {
    fn predict(&self, rows: &[Vec<f64>]) -> Result<Vec<f64>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        let x = to_matrix(rows, self.n_features)?;

        let predictions = self
            .model
            .predict(&x)
            .map_err(|e| anyhow::anyhow!("Prediction failed: {:?}", e))?;

        if predictions.len() != rows.len() {
            anyhow::bail!(
                "Model returned {} predictions for {} rows",
                predictions.len(),
                rows.len()
            );
        }
        Ok(predictions)
    }
}

fn to_matrix(rows: &[Vec<f64>], n_features: usize) -> Result<DenseMatrix<f64>> {
    let mut flat_data = Vec::with_capacity(rows.len() * n_features);
    for row in rows {
        if row.len() != n_features {
            anyhow::bail!(
                "All feature vectors must have {} values, got {}",
                n_features,
                row.len()
            );
        }
        flat_data.extend_from_slice(row);
    }
    Ok(DenseMatrix::new(rows.len(), n_features, flat_data, false))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn linear_dataset() -> (Vec<Vec<f64>>, Vec<f64>) {
        // y = 2x1 + 3x2
        let x: Vec<Vec<f64>> = (0..40)
            .map(|i| vec![(i % 8) as f64, (i / 8) as f64])
            .collect();
        let y = x.iter().map(|r| 2.0 * r[0] + 3.0 * r[1]).collect();
        (x, y)
    }

    #[test]
    fn test_parameters() {
        let params = SmartcoreRandomForest::parameters(150, None, 7, 42);
        assert_eq!(params.n_trees, 150);
        assert_eq!(params.max_depth, None);
        assert_eq!(params.m, Some(7));
        assert_eq!(params.seed, 42);
        assert!(!params.keep_samples);
    }

    #[test]
    fn test_train_and_predict() {
        let (x, y) = linear_dataset();
        let params = SmartcoreRandomForest::parameters(10, Some(6), 2, 42);
        let model = SmartcoreRandomForest::train(&x, &y, params).unwrap();
        assert_eq!(model.n_trees, 10);

        let pred = model.predict(&[vec![3.0, 2.0]]).unwrap();
        // 2*3 + 3*2 = 12
        assert!(pred[0] > 8.0 && pred[0] < 16.0, "got {}", pred[0]);
    }

    #[test]
    fn test_same_seed_same_forest() {
        let (x, y) = linear_dataset();
        let params = || SmartcoreRandomForest::parameters(8, None, 2, 7);
        let a = SmartcoreRandomForest::train(&x, &y, params()).unwrap();
        let b = SmartcoreRandomForest::train(&x, &y, params()).unwrap();
        assert_eq!(a.predict(&x).unwrap(), b.predict(&x).unwrap());
    }

    #[test]
    fn test_rejects_bad_shapes() {
        let (x, y) = linear_dataset();
        let params = || SmartcoreRandomForest::parameters(4, None, 2, 42);
        assert!(SmartcoreRandomForest::train(&[], &[], params()).is_err());
        assert!(SmartcoreRandomForest::train(&x, &y[..10], params()).is_err());

        let model = SmartcoreRandomForest::train(&x, &y, params()).unwrap();
        assert!(model.predict(&[vec![1.0]]).is_err());
    }
}

//! Feature standardization (zero mean, unit variance per column)

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Column-wise z-score scaler
///
/// Uses the population standard deviation. Constant columns get a scale of 1
/// so they are centred but not blown up.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    means: Vec<f64>,
    scales: Vec<f64>,
}

impl StandardScaler {
    /// Learn per-column mean and standard deviation
    pub fn fit(rows: &[Vec<f64>]) -> Result<Self> {
        let first = rows
            .first()
            .ok_or_else(|| anyhow::anyhow!("Cannot fit scaler on empty dataset"))?;
        let n_features = first.len();
        if rows.iter().any(|r| r.len() != n_features) {
            anyhow::bail!("All feature vectors must have the same length");
        }

        let n = rows.len() as f64;
        let means: Vec<f64> = (0..n_features)
            .map(|j| rows.iter().map(|r| r[j]).sum::<f64>() / n)
            .collect();
        let scales = (0..n_features)
            .map(|j| {
                let var = rows.iter().map(|r| (r[j] - means[j]).powi(2)).sum::<f64>() / n;
                let std = var.sqrt();
                if std < 1e-10 {
                    1.0
                } else {
                    std
                }
            })
            .collect();

        Ok(Self { means, scales })
    }

    pub fn n_features(&self) -> usize {
        self.means.len()
    }

    pub fn means(&self) -> &[f64] {
        &self.means
    }

    pub fn scales(&self) -> &[f64] {
        &self.scales
    }

    /// Standardize a single feature row
    pub fn transform_row(&self, row: &[f64]) -> Result<Vec<f64>> {
        if row.len() != self.means.len() {
            anyhow::bail!(
                "Standardization parameter count mismatch: expected {} features, got {}",
                self.means.len(),
                row.len()
            );
        }
        Ok(row
            .iter()
            .zip(self.means.iter().zip(self.scales.iter()))
            .map(|(x, (mean, scale))| (x - mean) / scale)
            .collect())
    }

    /// Standardize every row
    pub fn transform(&self, rows: &[Vec<f64>]) -> Result<Vec<Vec<f64>>> {
        rows.iter().map(|r| self.transform_row(r)).collect()
    }
}

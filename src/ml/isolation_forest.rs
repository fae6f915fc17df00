//! Isolation Forest anomaly detector
//!
//! Points that random axis-aligned splits isolate quickly (short average path
//! length) are outliers. Raw scores follow the usual convention
//! `s(x) = -2^(-E[h(x)] / c(psi))`, so lower means more anomalous. The
//! decision offset is the `contamination` percentile of the training scores.

use anyhow::Result;
use ordered_float::OrderedFloat;
use rand::{rngs::StdRng, seq::SliceRandom, Rng, SeedableRng};
use serde::{Deserialize, Serialize};

const EULER_GAMMA: f64 = 0.577_215_664_901_532_9;
const DEFAULT_MAX_SAMPLES: usize = 256;

#[derive(Debug, Clone, Serialize, Deserialize)]
enum Node {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        size: usize,
    },
}

/// One randomly grown isolation tree, stored as a node arena
#[derive(Debug, Clone, Serialize, Deserialize)]
struct IsolationTree {
    nodes: Vec<Node>,
}

impl IsolationTree {
    fn build(x: &[Vec<f64>], indices: &mut [usize], height_limit: usize, rng: &mut StdRng) -> Self {
        let mut tree = Self { nodes: Vec::new() };
        tree.grow(x, indices, 0, height_limit, rng);
        tree
    }

    fn grow(
        &mut self,
        x: &[Vec<f64>],
        indices: &mut [usize],
        depth: usize,
        height_limit: usize,
        rng: &mut StdRng,
    ) -> usize {
        let id = self.nodes.len();
        self.nodes.push(Node::Leaf {
            size: indices.len(),
        });
        if depth >= height_limit || indices.len() <= 1 {
            return id;
        }

        let mut features: Vec<usize> = (0..x[indices[0]].len()).collect();
        features.shuffle(rng);
        let spread = features.into_iter().find_map(|f| {
            let (lo, hi) = indices
                .iter()
                .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &i| {
                    (lo.min(x[i][f]), hi.max(x[i][f]))
                });
            (hi > lo).then_some((f, lo, hi))
        });
        // every candidate feature is constant here: nothing left to isolate
        let Some((feature, lo, hi)) = spread else {
            return id;
        };

        let threshold = rng.gen_range(lo..hi);
        let mut mid = 0;
        for k in 0..indices.len() {
            if x[indices[k]][feature] < threshold {
                indices.swap(k, mid);
                mid += 1;
            }
        }

        let (left_idx, right_idx) = indices.split_at_mut(mid);
        let left = self.grow(x, left_idx, depth + 1, height_limit, rng);
        let right = self.grow(x, right_idx, depth + 1, height_limit, rng);
        self.nodes[id] = Node::Split {
            feature,
            threshold,
            left,
            right,
        };
        id
    }

    fn path_length(&self, row: &[f64]) -> f64 {
        let mut node = 0;
        let mut depth = 0.0;
        loop {
            match self.nodes[node] {
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    node = if row[feature] < threshold { left } else { right };
                    depth += 1.0;
                }
                Node::Leaf { size } => return depth + average_path_length(size),
            }
        }
    }
}

/// Average path length of an unsuccessful BST search over `n` points
fn average_path_length(n: usize) -> f64 {
    match n {
        0 | 1 => 0.0,
        2 => 1.0,
        _ => {
            let n = n as f64;
            2.0 * ((n - 1.0).ln() + EULER_GAMMA) - 2.0 * (n - 1.0) / n
        }
    }
}

/// Linear-interpolated percentile, `q` in [0, 100]
fn percentile(values: &[f64], q: f64) -> f64 {
    let mut sorted: Vec<OrderedFloat<f64>> = values.iter().copied().map(OrderedFloat).collect();
    sorted.sort();
    let rank = (q / 100.0).clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let frac = rank - lo as f64;
    sorted[lo].0 + (sorted[hi].0 - sorted[lo].0) * frac
}

/// Isolation Forest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IsolationForest {
    n_estimators: usize,
    max_samples: usize,
    contamination: f64,
    random_state: u64,
    trees: Vec<IsolationTree>,
    sample_size: usize,
    n_features: usize,
    offset: f64,
}

impl Default for IsolationForest {
    fn default() -> Self {
        Self::new()
    }
}

impl IsolationForest {
    pub fn new() -> Self {
        Self {
            n_estimators: 100,
            max_samples: DEFAULT_MAX_SAMPLES,
            contamination: 0.1,
            random_state: 42,
            trees: Vec::new(),
            sample_size: 0,
            n_features: 0,
            offset: -0.5,
        }
    }

    pub fn with_n_estimators(mut self, n_estimators: usize) -> Self {
        self.n_estimators = n_estimators;
        self
    }

    /// Sub-sample size per tree (capped at the training set size)
    pub fn with_max_samples(mut self, max_samples: usize) -> Self {
        self.max_samples = max_samples;
        self
    }

    /// Expected fraction of outliers in the training data
    pub fn with_contamination(mut self, contamination: f64) -> Self {
        self.contamination = contamination;
        self
    }

    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = seed;
        self
    }

    pub fn is_fitted(&self) -> bool {
        !self.trees.is_empty()
    }

    /// Score offset separating inliers from outliers
    pub fn offset(&self) -> f64 {
        self.offset
    }

    pub fn fit(&mut self, x: &[Vec<f64>]) -> Result<()> {
        if x.is_empty() {
            anyhow::bail!("Cannot fit isolation forest on empty dataset");
        }
        if self.n_estimators == 0 {
            anyhow::bail!("Isolation forest needs at least one estimator");
        }
        if !(0.0..=0.5).contains(&self.contamination) {
            anyhow::bail!(
                "Contamination must be within [0, 0.5], got {}",
                self.contamination
            );
        }
        let n_features = x[0].len();
        if x.iter().any(|r| r.len() != n_features) {
            anyhow::bail!("All feature vectors must have the same length");
        }
        if x.iter().flatten().any(|v| !v.is_finite()) {
            anyhow::bail!("Isolation forest input contains non-finite values");
        }

        let n = x.len();
        let psi = self.max_samples.clamp(1, n);
        let height_limit = (psi as f64).log2().ceil() as usize;
        let mut rng = StdRng::seed_from_u64(self.random_state);

        self.trees = (0..self.n_estimators)
            .map(|_| {
                let mut indices = rand::seq::index::sample(&mut rng, n, psi).into_vec();
                IsolationTree::build(x, &mut indices, height_limit, &mut rng)
            })
            .collect();
        self.sample_size = psi;
        self.n_features = n_features;

        let scores = self.score_samples(x)?;
        self.offset = percentile(&scores, 100.0 * self.contamination);
        Ok(())
    }

    /// Raw anomaly scores in [-1, 0); lower is more anomalous
    pub fn score_samples(&self, x: &[Vec<f64>]) -> Result<Vec<f64>> {
        if !self.is_fitted() {
            anyhow::bail!("Isolation forest is not fitted");
        }
        let norm = average_path_length(self.sample_size).max(1.0);
        x.iter()
            .map(|row| {
                if row.len() != self.n_features {
                    anyhow::bail!(
                        "Expected {} features, got {}",
                        self.n_features,
                        row.len()
                    );
                }
                let mean_depth = self.trees.iter().map(|t| t.path_length(row)).sum::<f64>()
                    / self.trees.len() as f64;
                Ok(-(2f64.powf(-mean_depth / norm)))
            })
            .collect()
    }

    /// Scores shifted by the fitted offset; negative values are outliers
    pub fn decision_function(&self, x: &[Vec<f64>]) -> Result<Vec<f64>> {
        Ok(self
            .score_samples(x)?
            .into_iter()
            .map(|s| s - self.offset)
            .collect())
    }

    /// `true` for every row classified as an outlier
    pub fn predict(&self, x: &[Vec<f64>]) -> Result<Vec<bool>> {
        Ok(self
            .decision_function(x)?
            .into_iter()
            .map(|d| d < 0.0)
            .collect())
    }
}

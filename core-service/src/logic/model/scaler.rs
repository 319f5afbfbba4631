//! Standard Scaler - zero mean / unit variance per feature
//!
//! Fitted once on the training batch; prediction only calls `transform`.

use serde::{Deserialize, Serialize};

use crate::logic::features::FEATURE_COUNT;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    pub mean: [f64; FEATURE_COUNT],
    /// Population std; zero-variance features keep scale 1.0
    pub scale: [f64; FEATURE_COUNT],
    pub n_samples: usize,
}

impl StandardScaler {
    /// Fit on rows. An empty batch yields the identity transform.
    pub fn fit(rows: &[[f64; FEATURE_COUNT]]) -> Self {
        let n = rows.len();
        let mut mean = [0.0f64; FEATURE_COUNT];
        let mut scale = [1.0f64; FEATURE_COUNT];

        if n == 0 {
            return Self { mean, scale, n_samples: 0 };
        }

        for row in rows {
            for (m, v) in mean.iter_mut().zip(row.iter()) {
                *m += v;
            }
        }
        for m in mean.iter_mut() {
            *m /= n as f64;
        }

        for i in 0..FEATURE_COUNT {
            let variance = rows.iter().map(|row| (row[i] - mean[i]).powi(2)).sum::<f64>() / n as f64;
            let std = variance.sqrt();
            // near-constant columns would blow up under division
            scale[i] = if std > f64::EPSILON * mean[i].abs().max(1.0) { std } else { 1.0 };
        }

        Self { mean, scale, n_samples: n }
    }

    pub fn transform_row(&self, row: &[f64; FEATURE_COUNT]) -> [f64; FEATURE_COUNT] {
        let mut scaled = [0.0f64; FEATURE_COUNT];
        for i in 0..FEATURE_COUNT {
            scaled[i] = (row[i] - self.mean[i]) / self.scale[i];
        }
        scaled
    }

    pub fn transform(&self, rows: &[[f64; FEATURE_COUNT]]) -> Vec<[f64; FEATURE_COUNT]> {
        rows.iter().map(|row| self.transform_row(row)).collect()
    }
}

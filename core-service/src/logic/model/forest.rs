//! Isolation Forest implementation
//!
//! Anomalies are easier to isolate and thus have shorter path lengths in
//! the trees.
//!
//! Score convention (what the dashboard branches on):
//! `decision = score_samples - offset`, with
//! `score_samples = -2^(-E[h(x)] / c(psi))` and `offset` the contamination
//! percentile of the training scores. Higher is more normal; a negative
//! decision is an anomaly.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_CONTAMINATION;
use crate::logic::error::{PipelineError, PipelineResult};
use crate::logic::features::FEATURE_COUNT;

type Row = [f64; FEATURE_COUNT];

/// Forest hyper-parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForestConfig {
    /// Number of trees
    pub num_trees: usize,
    /// Upper bound on rows sampled (without replacement) per tree
    pub max_samples: usize,
    /// Expected proportion of anomalies, in (0, 0.5]
    pub contamination: f64,
    /// Seed for tree construction
    pub seed: u64,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            num_trees: 100,
            max_samples: 256,
            contamination: DEFAULT_CONTAMINATION,
            seed: 42,
        }
    }
}

impl ForestConfig {
    pub fn with_contamination(contamination: f64) -> Self {
        Self {
            contamination,
            ..Default::default()
        }
    }
}

/// Isolation Forest model for anomaly detection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IsolationForest {
    trees: Vec<IsolationTree>,
    /// Rows each tree was built from (psi)
    sample_size: usize,
    /// Decision threshold derived from contamination
    offset: f64,
    config: ForestConfig,
}

impl IsolationForest {
    /// Build the forest on already-scaled rows
    pub fn fit(data: &[Row], config: &ForestConfig) -> PipelineResult<Self> {
        if data.is_empty() {
            return Err(PipelineError::DataUnavailable("cannot fit isolation forest on zero rows".into()));
        }
        if !(config.contamination > 0.0 && config.contamination <= 0.5) {
            return Err(PipelineError::MalformedInput(format!(
                "contamination must be in (0, 0.5], got {}",
                config.contamination
            )));
        }

        let mut rng = StdRng::seed_from_u64(config.seed);
        let sample_size = config.max_samples.max(1).min(data.len());
        let max_depth = (sample_size.max(2) as f64).log2().ceil() as usize;

        let trees = (0..config.num_trees.max(1))
            .map(|_| {
                let sample: Vec<Row> = rand::seq::index::sample(&mut rng, data.len(), sample_size)
                    .into_iter()
                    .map(|idx| data[idx])
                    .collect();
                IsolationTree::build(&sample, max_depth, &mut rng)
            })
            .collect();

        let mut forest = Self {
            trees,
            sample_size,
            offset: 0.0,
            config: config.clone(),
        };

        let training_scores: Vec<f64> = data.iter().map(|row| forest.score_sample(row)).collect();
        forest.offset = percentile(&training_scores, config.contamination * 100.0);

        Ok(forest)
    }

    /// Calculate average path length of an unsuccessful BST search (c(n))
    pub fn average_path_length(n: usize) -> f64 {
        match n {
            0 | 1 => 0.0,
            2 => 1.0,
            _ => {
                let n = n as f64;
                2.0 * ((n - 1.0).ln() + 0.577_215_664_901_532_9) - 2.0 * (n - 1.0) / n
            }
        }
    }

    /// Raw score in [-1, 0): closer to -1 is more anomalous
    pub fn score_sample(&self, sample: &Row) -> f64 {
        let total: f64 = self.trees.iter().map(|tree| tree.path_length(sample)).sum();
        let avg_path = total / self.trees.len() as f64;

        let norm = Self::average_path_length(self.sample_size);
        let norm = if norm > 0.0 { norm } else { 1.0 };

        -(2.0_f64.powf(-avg_path / norm))
    }

    /// Decision value: higher is more normal, negative means anomaly
    pub fn decision(&self, sample: &Row) -> f64 {
        self.score_sample(sample) - self.offset
    }

    pub fn is_anomaly(&self, sample: &Row) -> bool {
        self.decision(sample) < 0.0
    }

    pub fn offset(&self) -> f64 {
        self.offset
    }

    pub fn config(&self) -> &ForestConfig {
        &self.config
    }

    pub fn num_trees(&self) -> usize {
        self.trees.len()
    }
}

/// Linear-interpolated percentile, `q` in [0, 100]
fn percentile(values: &[f64], q: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let rank = (q / 100.0).clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (rank - lo as f64)
}

/// A single isolation tree
#[derive(Debug, Clone, Serialize, Deserialize)]
struct IsolationTree {
    root: IsolationNode,
}

/// Node in an isolation tree
#[derive(Debug, Clone, Serialize, Deserialize)]
enum IsolationNode {
    Internal {
        feature_idx: usize,
        split_value: f64,
        left: Box<IsolationNode>,
        right: Box<IsolationNode>,
    },
    Leaf {
        size: usize,
    },
}

impl IsolationTree {
    fn build<R: Rng>(samples: &[Row], max_depth: usize, rng: &mut R) -> Self {
        Self {
            root: Self::build_node(samples, 0, max_depth, rng),
        }
    }

    fn build_node<R: Rng>(samples: &[Row], depth: usize, max_depth: usize, rng: &mut R) -> IsolationNode {
        if depth >= max_depth || samples.len() <= 1 {
            return IsolationNode::Leaf { size: samples.len() };
        }

        // Only features that still vary can split
        let mut candidates: Vec<(usize, f64, f64)> = Vec::with_capacity(FEATURE_COUNT);
        for feature_idx in 0..FEATURE_COUNT {
            let (min_val, max_val) = samples.iter().fold((f64::MAX, f64::MIN), |(lo, hi), s| {
                (lo.min(s[feature_idx]), hi.max(s[feature_idx]))
            });
            if max_val > min_val {
                candidates.push((feature_idx, min_val, max_val));
            }
        }

        if candidates.is_empty() {
            return IsolationNode::Leaf { size: samples.len() };
        }

        let (feature_idx, min_val, max_val) = candidates[rng.gen_range(0..candidates.len())];

        let mut split_value = min_val + rng.gen::<f64>() * (max_val - min_val);
        if split_value <= min_val {
            split_value = min_val + (max_val - min_val) / 2.0;
        }

        let (left_samples, right_samples): (Vec<Row>, Vec<Row>) =
            samples.iter().partition(|s| s[feature_idx] < split_value);

        IsolationNode::Internal {
            feature_idx,
            split_value,
            left: Box::new(Self::build_node(&left_samples, depth + 1, max_depth, rng)),
            right: Box::new(Self::build_node(&right_samples, depth + 1, max_depth, rng)),
        }
    }

    fn path_length(&self, sample: &Row) -> f64 {
        let mut node = &self.root;
        let mut depth = 0usize;

        loop {
            match node {
                IsolationNode::Leaf { size } => {
                    // Expected remaining depth for leaves that stopped early
                    return depth as f64 + IsolationForest::average_path_length(*size);
                }
                IsolationNode::Internal { feature_idx, split_value, left, right } => {
                    node = if sample[*feature_idx] < *split_value { left } else { right };
                    depth += 1;
                }
            }
        }
    }
}

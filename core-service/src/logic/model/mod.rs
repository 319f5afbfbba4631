//! Model Module - scaler + isolation forest anomaly model
//!
//! Tách logic model khỏi feature extraction và serving.

pub mod scaler;
pub mod forest;
pub mod storage;
pub mod prediction;
pub mod detector;

#[cfg(test)]
mod tests;

// Re-export common types
pub use detector::{AnomalyDetector, ModelStatus, TrainedModel, TrainingReport};
pub use forest::{ForestConfig, IsolationForest};
pub use prediction::{Label, Predictions, ScoredRecord};
pub use scaler::StandardScaler;

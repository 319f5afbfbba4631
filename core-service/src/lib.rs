//! WiFi Monitor Core - live packet buffer and anomaly detection pipeline

pub mod constants;
pub mod logic;

pub use logic::buffer::{BufferStatus, PacketBuffer};
pub use logic::capture::{spawn_producer, PacketSource, ProducerHandle, ReplaySource, SyntheticSource};
pub use logic::config::MonitorConfig;
pub use logic::dataset::{read_dataset, write_dataset, TrainingDataset};
pub use logic::error::{PipelineError, PipelineResult};
pub use logic::features::{FeatureExtractor, FeatureVector};
pub use logic::model::{AnomalyDetector, Label, ModelStatus, Predictions, ScoredRecord, TrainingReport};
pub use logic::packet::PacketRecord;
pub use logic::stats::{HourlyBucket, Stats};

//! Anomaly Detector - model lifecycle (train / save / load / predict)
//!
//! States: Untrained → Trained via `train()` or a successful `load()`.
//! The active model is an `Arc` swapped under a read-write lock, so
//! predictions in flight finish against the handle they started with.
//! Writers (train, save, load) are serialized by a separate mutex.

use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::forest::{ForestConfig, IsolationForest};
use super::prediction::{Label, Predictions, ScoredRecord};
use super::scaler::StandardScaler;
use super::storage::{commit_artifacts, load_artifact, stage_artifact, ArtifactKind};
use crate::constants::BOOTSTRAP_LENGTH_THRESHOLD;
use crate::logic::config::MonitorConfig;
use crate::logic::dataset;
use crate::logic::error::{PipelineError, PipelineResult};
use crate::logic::features::{feature_matrix, layout_hash, FeatureExtractor, FeatureVector, FEATURE_VERSION};
use crate::logic::packet::PacketRecord;

// ============================================================================
// DATA STRUCTURES
// ============================================================================

/// Fitted scaler + forest from one training run
#[derive(Debug, Clone)]
pub struct TrainedModel {
    pub model_id: Uuid,
    pub trained_at: DateTime<Utc>,
    pub trained_on: usize,
    pub scaler: StandardScaler,
    pub forest: IsolationForest,
}

/// Persisted model payload (the scaler is its own artifact)
#[derive(Debug, Serialize, Deserialize)]
struct ModelPayload {
    trained_at: DateTime<Utc>,
    trained_on: usize,
    forest: IsolationForest,
}

impl TrainedModel {
    /// Fit scaler then forest on the batch's feature vectors
    pub fn fit(vectors: &[FeatureVector], config: &ForestConfig) -> PipelineResult<Self> {
        if vectors.is_empty() {
            return Err(PipelineError::DataUnavailable("training batch is empty".into()));
        }

        let rows = feature_matrix(vectors);
        let scaler = StandardScaler::fit(&rows);
        let forest = IsolationForest::fit(&scaler.transform(&rows), config)?;

        Ok(Self {
            model_id: Uuid::new_v4(),
            trained_at: Utc::now(),
            trained_on: vectors.len(),
            scaler,
            forest,
        })
    }

    /// Scale with the stored scaler (never refit) and score
    pub fn predict(&self, vectors: &[FeatureVector]) -> Predictions {
        let mut predictions = Predictions {
            labels: Vec::with_capacity(vectors.len()),
            scores: Vec::with_capacity(vectors.len()),
        };

        for row in self.scaler.transform(&feature_matrix(vectors)) {
            let score = self.forest.decision(&row);
            predictions.scores.push(score);
            predictions.labels.push(if score < 0.0 { Label::Anomaly } else { Label::Normal });
        }

        predictions
    }
}

/// Outcome of a training run
#[derive(Debug, Clone, Serialize)]
pub struct TrainingReport {
    pub model_id: Uuid,
    pub trained_at: DateTime<Utc>,
    /// Agreement between model labels and the length > 1000 heuristic
    pub accuracy: f64,
    pub total_packets: usize,
    /// Heuristic label counts (validation only, never fitted on)
    pub normal_packets: usize,
    pub anomalous_packets: usize,
    pub predicted_anomalies: usize,
    pub contamination: f64,
    #[serde(skip)]
    pub model: Arc<TrainedModel>,
}

/// Model status for UI
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelStatus {
    pub trained: bool,
    pub model_id: Option<Uuid>,
    pub trained_at: Option<DateTime<Utc>>,
    pub trained_on: Option<usize>,
    /// Contamination of the active model, or the configured value when untrained
    pub contamination: f64,
    pub num_trees: Option<usize>,
    /// Score percentile separating Normal from Anomaly
    pub decision_offset: Option<f64>,
    pub feature_version: u8,
    pub layout_hash: u32,
    pub model_path: String,
    pub scaler_path: String,
    pub predictions_served: u64,
    pub failed_loads: u64,
}

// ============================================================================
// DETECTOR
// ============================================================================

pub struct AnomalyDetector {
    config: MonitorConfig,
    forest_config: ForestConfig,
    extractor: FeatureExtractor,
    active: RwLock<Option<Arc<TrainedModel>>>,
    writer: Mutex<()>,
    predictions_served: AtomicU64,
    failed_loads: AtomicU64,
}

impl AnomalyDetector {
    pub fn new(config: MonitorConfig) -> Self {
        Self::with_extractor(config, FeatureExtractor::new())
    }

    /// Detector with an injected (e.g. seeded) feature extractor
    pub fn with_extractor(config: MonitorConfig, extractor: FeatureExtractor) -> Self {
        let forest_config = ForestConfig::with_contamination(config.contamination);
        Self {
            config,
            forest_config,
            extractor,
            active: RwLock::new(None),
            writer: Mutex::new(()),
            predictions_served: AtomicU64::new(0),
            failed_loads: AtomicU64::new(0),
        }
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    pub fn extractor(&self) -> &FeatureExtractor {
        &self.extractor
    }

    pub fn is_trained(&self) -> bool {
        self.active.read().is_some()
    }

    /// Current model handle, if any
    pub fn handle(&self) -> Option<Arc<TrainedModel>> {
        self.active.read().clone()
    }

    // ------------------------------------------------------------------------
    // TRAINING
    // ------------------------------------------------------------------------

    /// Fit on `records`, persist both artifacts, then activate the new model.
    ///
    /// If persisting fails the previous in-memory model stays active and the
    /// error is returned, so disk and memory never disagree.
    pub fn train(&self, records: &[PacketRecord]) -> PipelineResult<TrainingReport> {
        if records.is_empty() {
            log::warn!("Training skipped: dataset is empty");
            return Err(PipelineError::DataUnavailable("training dataset is empty".into()));
        }

        let _guard = self.writer.lock();

        let vectors = self.extractor.extract(records);
        let model = Arc::new(TrainedModel::fit(&vectors, &self.forest_config)?);
        let predictions = model.predict(&vectors);

        let mut agree = 0usize;
        let mut anomalous_packets = 0usize;
        for (record, label) in records.iter().zip(&predictions.labels) {
            let heuristic = record.length > BOOTSTRAP_LENGTH_THRESHOLD;
            if heuristic {
                anomalous_packets += 1;
            }
            if heuristic == label.is_anomaly() {
                agree += 1;
            }
        }

        self.persist(&model)?;
        *self.active.write() = Some(Arc::clone(&model));

        let report = TrainingReport {
            model_id: model.model_id,
            trained_at: model.trained_at,
            accuracy: agree as f64 / records.len() as f64,
            total_packets: records.len(),
            normal_packets: records.len() - anomalous_packets,
            anomalous_packets,
            predicted_anomalies: predictions.anomaly_count(),
            contamination: self.forest_config.contamination,
            model,
        };

        log::info!(
            "Model {} trained on {} packets: accuracy {:.2}% ({} heuristic anomalies, {} predicted)",
            report.model_id,
            report.total_packets,
            report.accuracy * 100.0,
            report.anomalous_packets,
            report.predicted_anomalies
        );

        Ok(report)
    }

    /// Train from a CSV dataset file
    pub fn train_from_csv(&self, path: &Path) -> PipelineResult<TrainingReport> {
        let dataset = dataset::read_dataset(path)?;
        if dataset.summary.coerced_fields > 0 {
            log::warn!(
                "{} fields in {} were coerced to defaults",
                dataset.summary.coerced_fields,
                path.display()
            );
        }
        self.train(&dataset.records)
    }

    // ------------------------------------------------------------------------
    // PERSISTENCE
    // ------------------------------------------------------------------------

    /// Write the active model's artifacts
    pub fn save(&self) -> PipelineResult<()> {
        let _guard = self.writer.lock();
        let model = self.handle().ok_or(PipelineError::ModelNotReady)?;
        self.persist(&model)
    }

    fn persist(&self, model: &TrainedModel) -> PipelineResult<()> {
        let payload = ModelPayload {
            trained_at: model.trained_at,
            trained_on: model.trained_on,
            forest: model.forest.clone(),
        };

        // Both temp files must exist before either target is replaced
        let scaler = stage_artifact(&self.config.scaler_path(), ArtifactKind::Scaler, model.model_id, &model.scaler)?;
        let forest = match stage_artifact(&self.config.model_path(), ArtifactKind::Model, model.model_id, &payload) {
            Ok(staged) => staged,
            Err(e) => {
                scaler.discard();
                return Err(e);
            }
        };
        commit_artifacts(vec![scaler, forest])?;

        log::info!("Model {} saved to {}", model.model_id, self.config.model_dir.display());
        Ok(())
    }

    /// Restore both artifacts. False (state unchanged) if either is missing or invalid.
    pub fn load(&self) -> bool {
        match self.try_load() {
            Ok(model) => {
                log::info!("Model {} loaded ({} training packets)", model.model_id, model.trained_on);
                true
            }
            Err(PipelineError::ArtifactMissing(path)) => {
                log::info!("Model artifact not found: {}", path.display());
                false
            }
            Err(e) => {
                log::error!("Model load failed: {}", e);
                false
            }
        }
    }

    /// `load()` with the typed reason on failure
    pub fn try_load(&self) -> PipelineResult<Arc<TrainedModel>> {
        let _guard = self.writer.lock();

        let result = self.read_artifacts();
        match &result {
            Ok(model) => *self.active.write() = Some(Arc::clone(model)),
            Err(_) => {
                self.failed_loads.fetch_add(1, Ordering::Relaxed);
            }
        }
        result
    }

    fn read_artifacts(&self) -> PipelineResult<Arc<TrainedModel>> {
        let scaler_path = self.config.scaler_path();
        let model_path = self.config.model_path();

        let (scaler_header, scaler): (_, StandardScaler) = load_artifact(&scaler_path, ArtifactKind::Scaler)?;
        let (model_header, payload): (_, ModelPayload) = load_artifact(&model_path, ArtifactKind::Model)?;

        if scaler_header.model_id != model_header.model_id {
            return Err(PipelineError::corrupt(
                &model_path,
                format!(
                    "scaler {} and model {} come from different training runs",
                    scaler_header.model_id, model_header.model_id
                ),
            ));
        }

        Ok(Arc::new(TrainedModel {
            model_id: model_header.model_id,
            trained_at: payload.trained_at,
            trained_on: payload.trained_on,
            scaler,
            forest: payload.forest,
        }))
    }

    // ------------------------------------------------------------------------
    // PREDICTION
    // ------------------------------------------------------------------------

    /// Active handle, lazily loading from disk once. Never trains.
    fn ready_handle(&self) -> PipelineResult<Arc<TrainedModel>> {
        if let Some(model) = self.handle() {
            return Ok(model);
        }

        match self.try_load() {
            Ok(model) => Ok(model),
            Err(e) => {
                log::warn!("Prediction refused, no usable model: {}", e);
                Err(PipelineError::ModelNotReady)
            }
        }
    }

    /// Labels and decision scores (higher = more normal, negative = anomaly)
    pub fn predict(&self, records: &[PacketRecord]) -> PipelineResult<Predictions> {
        let model = self.ready_handle()?;
        let vectors = self.extractor.extract(records);
        let predictions = model.predict(&vectors);

        if log::log_enabled!(log::Level::Trace) {
            for (vector, score) in vectors.iter().zip(&predictions.scores).filter(|(_, s)| **s < 0.0) {
                log::trace!("Anomaly {:.4}: {}", score, vector.to_log_entry());
            }
        }

        self.predictions_served.fetch_add(predictions.len() as u64, Ordering::Relaxed);
        Ok(predictions)
    }

    /// `predict` joined back onto the input records
    pub fn score_records(&self, records: &[PacketRecord]) -> PipelineResult<Vec<ScoredRecord>> {
        Ok(self.predict(records)?.attach(records))
    }

    /// Loaded, or trained from the bootstrap dataset if nothing is on disk
    pub fn ensure_ready(&self) -> PipelineResult<()> {
        if self.is_trained() || self.load() {
            return Ok(());
        }

        log::info!("Model not loaded, training new model from {}", self.config.dataset_path.display());
        self.train_from_csv(&self.config.dataset_path).map(|_| ())
    }

    pub fn status(&self) -> ModelStatus {
        let model = self.handle();

        ModelStatus {
            trained: model.is_some(),
            model_id: model.as_ref().map(|m| m.model_id),
            trained_at: model.as_ref().map(|m| m.trained_at),
            trained_on: model.as_ref().map(|m| m.trained_on),
            contamination: model
                .as_ref()
                .map_or(self.forest_config.contamination, |m| m.forest.config().contamination),
            num_trees: model.as_ref().map(|m| m.forest.num_trees()),
            decision_offset: model.as_ref().map(|m| m.forest.offset()),
            feature_version: FEATURE_VERSION,
            layout_hash: layout_hash(),
            model_path: self.config.model_path().display().to_string(),
            scaler_path: self.config.scaler_path().display().to_string(),
            predictions_served: self.predictions_served.load(Ordering::Relaxed),
            failed_loads: self.failed_loads.load(Ordering::Relaxed),
        }
    }
}

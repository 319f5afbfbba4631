//! Model handlers: retrain, status, dataset export

use axum::{extract::State, Json};
use serde::Serialize;

use wifi_monitor_core::{write_dataset, ModelStatus, TrainingReport};

use crate::{AppResult, AppState};

#[derive(Debug, Serialize)]
pub struct RetrainResponse {
    pub success: bool,
    pub message: String,
    pub report: TrainingReport,
}

#[derive(Debug, Serialize)]
pub struct ModelStatusResponse {
    pub success: bool,
    pub model: ModelStatus,
}

#[derive(Debug, Serialize)]
pub struct ExportResponse {
    pub success: bool,
    pub path: String,
    pub rows: usize,
}

/// Retrain on the current buffer snapshot
pub async fn retrain(State(state): State<AppState>) -> AppResult<Json<RetrainResponse>> {
    let records = state.buffer.snapshot();
    let samples = records.len();
    tracing::info!("Retraining model on {} buffered packets", samples);

    let detector = state.detector.clone();
    let report = tokio::task::spawn_blocking(move || detector.train(&records)).await??;

    Ok(Json(RetrainResponse {
        success: true,
        message: format!("Model retrained with {} live samples", samples),
        report,
    }))
}

pub async fn status(State(state): State<AppState>) -> Json<ModelStatusResponse> {
    Json(ModelStatusResponse {
        success: true,
        model: state.detector.status(),
    })
}

/// Write the buffer to a timestamped CSV usable as a training dataset
pub async fn export_dataset(State(state): State<AppState>) -> AppResult<Json<ExportResponse>> {
    let records = state.buffer.snapshot();
    let file_name = format!("live_traffic_{}.csv", chrono::Local::now().format("%Y%m%d_%H%M%S"));
    let path = state.config.export_dir.join(file_name);

    let target = path.clone();
    let rows = tokio::task::spawn_blocking(move || write_dataset(&target, &records)).await??;

    Ok(Json(ExportResponse {
        success: true,
        path: path.display().to_string(),
        rows,
    }))
}

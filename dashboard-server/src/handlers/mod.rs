//! HTTP handlers

pub mod health;
pub mod stats;
pub mod live;
pub mod queue;
pub mod model;

use wifi_monitor_core::{PacketRecord, PipelineError, ScoredRecord};

use crate::{AppResult, AppState};

/// Score a buffer snapshot off the async runtime.
///
/// An empty snapshot never touches the model. With `bootstrap` set, a missing
/// model is loaded or trained from the bootstrap dataset first.
pub(crate) async fn score_snapshot(
    state: &AppState,
    records: Vec<PacketRecord>,
    bootstrap: bool,
) -> AppResult<Vec<ScoredRecord>> {
    if records.is_empty() {
        return Ok(Vec::new());
    }

    let detector = state.detector.clone();
    let scored = tokio::task::spawn_blocking(move || {
        if bootstrap {
            if let Err(e) = detector.ensure_ready() {
                tracing::warn!("Model initialization failed: {}", e);
                return Err(PipelineError::ModelNotReady);
            }
        }
        detector.score_records(&records)
    })
    .await??;

    Ok(scored)
}

/// Local wall-clock time in the buffer's timestamp format
pub(crate) fn now_string() -> String {
    wifi_monitor_core::logic::packet::format_timestamp(&chrono::Local::now().naive_local())
}

//! Queue status handler

use axum::{extract::State, Json};
use serde::Serialize;

use wifi_monitor_core::BufferStatus;

use super::now_string;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct QueueStatusResponse {
    pub success: bool,
    #[serde(flatten)]
    pub status: BufferStatus,
    pub timestamp: String,
}

pub async fn queue_status(State(state): State<AppState>) -> Json<QueueStatusResponse> {
    Json(QueueStatusResponse {
        success: true,
        status: state.buffer.status(),
        timestamp: now_string(),
    })
}

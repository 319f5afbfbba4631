//! Dashboard, history and current-stats handlers

use axum::{extract::State, Json};
use chrono::Duration;
use serde::Serialize;

use wifi_monitor_core::logic::stats::{aggregate, anomaly_history, hourly_buckets, recent_anomalies};
use wifi_monitor_core::{HourlyBucket, ScoredRecord, Stats};

use super::{now_string, score_snapshot};
use crate::{AppResult, AppState};

/// Dashboard covers the last day of buffered traffic
const DASHBOARD_WINDOW_HOURS: i64 = 24;
const DASHBOARD_RECENT_ANOMALIES: usize = 10;

#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub success: bool,
    pub stats: Stats,
    pub hourly_stats: Vec<HourlyBucket>,
    pub recent_anomalies: Vec<ScoredRecord>,
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub success: bool,
    pub data: Vec<ScoredRecord>,
    pub stats: Stats,
    pub total_anomalies: usize,
}

#[derive(Debug, Serialize)]
pub struct CurrentStatsResponse {
    pub success: bool,
    pub stats: Stats,
    pub queue_size: usize,
    pub last_updated: String,
}

/// 24h stats, hourly breakdown and the latest anomalies
pub async fn dashboard(State(state): State<AppState>) -> AppResult<Json<DashboardResponse>> {
    let records = state.buffer.recent(Duration::hours(DASHBOARD_WINDOW_HOURS));
    if records.is_empty() {
        tracing::info!("No live data available for dashboard");
    }

    let scored = score_snapshot(&state, records, true).await?;

    Ok(Json(DashboardResponse {
        success: true,
        stats: aggregate(&scored),
        hourly_stats: hourly_buckets(&scored),
        recent_anomalies: recent_anomalies(&scored, DASHBOARD_RECENT_ANOMALIES),
    }))
}

/// Every buffered anomaly, newest first
pub async fn history(State(state): State<AppState>) -> AppResult<Json<HistoryResponse>> {
    let scored = score_snapshot(&state, state.buffer.snapshot(), true).await?;
    let data = anomaly_history(&scored);

    Ok(Json(HistoryResponse {
        success: true,
        stats: aggregate(&scored),
        total_anomalies: data.len(),
        data,
    }))
}

/// Stats over the whole buffer
pub async fn current_stats(State(state): State<AppState>) -> AppResult<Json<CurrentStatsResponse>> {
    let records = state.buffer.snapshot();
    let queue_size = records.len();
    let scored = score_snapshot(&state, records, false).await?;

    Ok(Json(CurrentStatsResponse {
        success: true,
        stats: aggregate(&scored),
        queue_size,
        last_updated: now_string(),
    }))
}

//! Live polling handler

use axum::{extract::{Query, State}, Json};
use chrono::Duration;
use serde::{Deserialize, Serialize};
use validator::Validate;

use wifi_monitor_core::logic::stats::{aggregate, tail};
use wifi_monitor_core::{ScoredRecord, Stats};

use super::score_snapshot;
use crate::{AppResult, AppState};

const DEFAULT_WINDOW_MINUTES: u32 = 10;
const LIVE_TAIL: usize = 50;

#[derive(Debug, Deserialize, Validate)]
pub struct LiveQuery {
    /// Look-back window, defaults to 10 minutes
    #[validate(range(min = 1, max = 1440))]
    pub minutes: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct LiveDataResponse {
    pub success: bool,
    pub stats: Stats,
    pub recent_data: Vec<ScoredRecord>,
    pub total_packets: usize,
    pub window_minutes: u32,
}

/// Scored packets from the recent window, last 50 returned
pub async fn live_data(
    State(state): State<AppState>,
    Query(query): Query<LiveQuery>,
) -> AppResult<Json<LiveDataResponse>> {
    query.validate()?;
    let window_minutes = query.minutes.unwrap_or(DEFAULT_WINDOW_MINUTES);

    let records = state.buffer.recent(Duration::minutes(i64::from(window_minutes)));
    let scored = score_snapshot(&state, records, false).await?;

    Ok(Json(LiveDataResponse {
        success: true,
        stats: aggregate(&scored),
        recent_data: tail(&scored, LIVE_TAIL),
        total_packets: scored.len(),
        window_minutes,
    }))
}

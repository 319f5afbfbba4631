//! WiFi Monitor Dashboard Server
//!
//! HTTP API over the live anomaly-detection pipeline.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                    WIFI MONITOR DASHBOARD                    │
//! ├──────────────────────────────────────────────────────────────┤
//! │  ┌──────────────┐     ┌──────────────┐     ┌──────────────┐  │
//! │  │   Capture    │────▶│ PacketBuffer │◀────│   API (Axum) │  │
//! │  │   (thread)   │     │  (500 max)   │     │              │  │
//! │  └──────────────┘     └──────────────┘     └──────┬───────┘  │
//! │                                                   ▼          │
//! │                                          ┌────────────────┐  │
//! │                                          │ AnomalyDetector│  │
//! │                                          │ scaler+forest  │  │
//! │                                          └────────────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//! ```

mod config;
mod handlers;
mod error;

#[cfg(test)]
mod tests;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::{
    Router,
    routing::{get, post},
};
use tower_http::{
    cors::{CorsLayer, Any},
    trace::TraceLayer,
    compression::CompressionLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use wifi_monitor_core::{
    read_dataset, spawn_producer, AnomalyDetector, PacketBuffer, PacketSource, ProducerHandle, ReplaySource,
    SyntheticSource,
};

use config::CaptureMode;
pub use error::{AppError, AppResult};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    dotenvy::dotenv().ok();
    let config = config::Config::from_env();

    // Initialize logging (core crate logs through `log`, bridged by tracing-subscriber)
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "wifi_monitor_dashboard=debug,wifi_monitor_core=info,tower_http=debug".into());
    if config.is_production() {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    tracing::info!("WiFi Monitor Dashboard starting...");
    tracing::info!("Model directory: {}", config.monitor.model_dir.display());

    // Build application state
    let state = AppState {
        buffer: Arc::new(PacketBuffer::new(config.monitor.buffer_capacity)),
        detector: Arc::new(AnomalyDetector::new(config.monitor.clone())),
        config: config.clone(),
    };

    // Warm the model so the first dashboard request does not train
    let detector = state.detector.clone();
    match tokio::task::spawn_blocking(move || detector.ensure_ready()).await? {
        Ok(()) => tracing::info!("Model ready"),
        Err(e) => tracing::warn!("Model not ready at startup: {} (POST /api/retrain-model once data arrives)", e),
    }

    let producer = start_capture(&state)?;

    // Build router
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("🚀 Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    if let Some(producer) = producer {
        let produced = tokio::task::spawn_blocking(move || producer.stop()).await?;
        tracing::info!("Capture stopped, {} packets produced", produced);
    }

    Ok(())
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub buffer: Arc<PacketBuffer>,
    pub detector: Arc<AnomalyDetector>,
    pub config: config::Config,
}

/// Start the configured packet source feeding the buffer
fn start_capture(state: &AppState) -> anyhow::Result<Option<ProducerHandle>> {
    let source: Box<dyn PacketSource> = match state.config.capture {
        CaptureMode::Disabled => {
            tracing::info!("Capture disabled");
            return Ok(None);
        }
        CaptureMode::Synthetic => Box::new(SyntheticSource::new(chrono::Utc::now().timestamp() as u64)),
        CaptureMode::Replay => match read_dataset(&state.config.monitor.dataset_path) {
            Ok(dataset) => Box::new(ReplaySource::new(dataset.records, true)),
            Err(e) => {
                tracing::warn!("Replay capture unavailable: {}", e);
                return Ok(None);
            }
        },
    };

    let handle = spawn_producer(source, state.buffer.clone(), state.config.capture_interval)
        .context("failed to start capture thread")?;
    Ok(Some(handle))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
    tracing::info!("Shutting down...");
}

/// Create the main router with all routes
fn create_router(state: AppState) -> Router {
    let api_routes = Router::new()
        // Pages data
        .route("/api/dashboard", get(handlers::stats::dashboard))
        .route("/api/history", get(handlers::stats::history))

        // Polling
        .route("/api/live-data", get(handlers::live::live_data))
        .route("/api/current-stats", get(handlers::stats::current_stats))
        .route("/api/queue-status", get(handlers::queue::queue_status))

        // Model
        .route("/api/retrain-model", post(handlers::model::retrain))
        .route("/api/model-status", get(handlers::model::status))
        .route("/api/export-dataset", post(handlers::model::export_dataset));

    Router::new()
        .route("/health", get(handlers::health::check))
        .merge(api_routes)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        )
        .with_state(state)
}

//! Offline trainer: fit the anomaly model on a CSV dataset and save it.
//!
//! Usage: `wifi-monitor-train [DATASET_CSV]`
//! The dataset defaults to `WIFI_MONITOR_DATASET`, artifacts go to
//! `WIFI_MONITOR_MODEL_DIR`.

use std::path::PathBuf;

use anyhow::Context;

use wifi_monitor_core::constants::{APP_NAME, APP_VERSION};
use wifi_monitor_core::{AnomalyDetector, MonitorConfig};

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("Starting {} trainer v{}", APP_NAME, APP_VERSION);

    let config = MonitorConfig::from_env();
    let dataset = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| config.dataset_path.clone());

    let detector = AnomalyDetector::new(config);
    let report = detector
        .train_from_csv(&dataset)
        .with_context(|| format!("training from {} failed", dataset.display()))?;

    println!("{}", serde_json::to_string_pretty(&report)?);
    println!("Model saved to {}", detector.config().model_dir.display());
    Ok(())
}

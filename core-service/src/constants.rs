//! Central Configuration Constants
//!
//! Single source of truth for pipeline defaults.
//! Every value can be overridden through the environment.

use std::path::PathBuf;

/// Default capacity of the live packet buffer
pub const DEFAULT_BUFFER_CAPACITY: usize = 500;

/// Default expected proportion of anomalies in training data
pub const DEFAULT_CONTAMINATION: f64 = 0.1;

/// Packets longer than this are labeled anomalous for accuracy reporting only
pub const BOOTSTRAP_LENGTH_THRESHOLD: u64 = 1000;

/// Fixed timestamp format shared by capture, buffer and dataset
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Default bootstrap dataset file name
pub const DEFAULT_DATASET_FILE: &str = "live_traffic.csv";

/// Artifact file names inside the model directory
pub const SCALER_FILE: &str = "scaler.json";
pub const MODEL_FILE: &str = "model.json";

/// App version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// App name
pub const APP_NAME: &str = "wifi-monitor";

// ============================================
// Helper functions to read from env with fallback
// ============================================

/// Base data directory for this app
pub fn get_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

/// Directory holding the scaler and model artifacts
pub fn get_model_dir() -> PathBuf {
    std::env::var("WIFI_MONITOR_MODEL_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| get_data_dir().join("models"))
}

/// Bootstrap training dataset path
pub fn get_dataset_path() -> PathBuf {
    std::env::var("WIFI_MONITOR_DATASET")
        .map(PathBuf::from)
        .unwrap_or_else(|_| get_data_dir().join(DEFAULT_DATASET_FILE))
}

/// Live buffer capacity from environment or default
pub fn get_buffer_capacity() -> usize {
    std::env::var("WIFI_MONITOR_BUFFER_CAPACITY")
        .ok()
        .and_then(|s| s.parse().ok())
        .filter(|&c: &usize| c > 0)
        .unwrap_or(DEFAULT_BUFFER_CAPACITY)
}

/// Contamination fraction from environment or default
pub fn get_contamination() -> f64 {
    std::env::var("WIFI_MONITOR_CONTAMINATION")
        .ok()
        .and_then(|s| s.parse().ok())
        .filter(|&c: &f64| c > 0.0 && c <= 0.5)
        .unwrap_or(DEFAULT_CONTAMINATION)
}

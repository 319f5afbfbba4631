//! Pipeline configuration

use std::path::{Path, PathBuf};

use crate::constants::{self, MODEL_FILE, SCALER_FILE};

/// Runtime configuration for buffer, dataset and model artifacts
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Directory holding scaler.json and model.json
    pub model_dir: PathBuf,

    /// Bootstrap CSV used when no artifacts exist
    pub dataset_path: PathBuf,

    /// Live buffer capacity
    pub buffer_capacity: usize,

    /// Expected anomaly fraction when fitting
    pub contamination: f64,
}

impl MonitorConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self {
            model_dir: constants::get_model_dir(),
            dataset_path: constants::get_dataset_path(),
            buffer_capacity: constants::get_buffer_capacity(),
            contamination: constants::get_contamination(),
        }
    }

    /// Same defaults, artifacts rooted at `dir`
    pub fn with_model_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.model_dir = dir.as_ref().to_path_buf();
        self
    }

    pub fn scaler_path(&self) -> PathBuf {
        self.model_dir.join(SCALER_FILE)
    }

    pub fn model_path(&self) -> PathBuf {
        self.model_dir.join(MODEL_FILE)
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

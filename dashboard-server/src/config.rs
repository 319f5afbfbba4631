//! Configuration module

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use wifi_monitor_core::constants::get_data_dir;
use wifi_monitor_core::MonitorConfig;

/// Where live packets come from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureMode {
    /// Generated traffic (default, needs no privileges)
    Synthetic,
    /// Loop over the bootstrap dataset with fresh timestamps
    Replay,
    /// Nothing feeds the buffer
    Disabled,
}

impl CaptureMode {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "synthetic" => Some(Self::Synthetic),
            "replay" => Some(Self::Replay),
            "none" | "off" | "disabled" => Some(Self::Disabled),
            _ => None,
        }
    }
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Server port
    pub port: u16,

    /// Environment (development, production)
    pub environment: String,

    /// Capture source for the live buffer
    pub capture: CaptureMode,

    /// Delay between captured packets
    pub capture_interval: Duration,

    /// Directory for CSV exports of the buffer
    pub export_dir: PathBuf,

    /// Pipeline settings (model dir, dataset, buffer capacity, contamination)
    pub monitor: MonitorConfig,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8000),

            environment: env::var("ENVIRONMENT")
                .unwrap_or_else(|_| "development".to_string()),

            capture: env::var("CAPTURE_SOURCE")
                .ok()
                .and_then(|s| CaptureMode::parse(&s))
                .unwrap_or(CaptureMode::Synthetic),

            capture_interval: Duration::from_millis(
                env::var("CAPTURE_INTERVAL_MS")
                    .ok()
                    .and_then(|ms| ms.parse().ok())
                    .unwrap_or(200),
            ),

            export_dir: env::var("EXPORT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| get_data_dir().join("exports")),

            monitor: MonitorConfig::from_env(),
        }
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

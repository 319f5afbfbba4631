//! Pipeline error taxonomy
//!
//! Every component boundary returns one of these instead of panicking.
//! The serving layer maps them to user-visible messages.

use std::path::PathBuf;
use thiserror::Error;

pub type PipelineResult<T> = Result<T, PipelineError>;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// Empty dataset or empty buffer. Callers usually render this as an empty result.
    #[error("no data available: {0}")]
    DataUnavailable(String),

    /// Scaler or model artifact not found on disk
    #[error("artifact missing: {}", .0.display())]
    ArtifactMissing(PathBuf),

    /// Input that cannot be coerced at the boundary (e.g. no Length column)
    #[error("malformed input: {0}")]
    MalformedInput(String),

    /// predict() requested before any successful train or load
    #[error("model not ready: train or load a model first")]
    ModelNotReady,

    /// Disk read/write failure on artifacts
    #[error("persistence failure on {}: {source}", path.display())]
    Persistence {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Artifact present but undecodable, tampered or from another layout
    #[error("corrupt artifact {}: {reason}", path.display())]
    CorruptArtifact { path: PathBuf, reason: String },
}

impl PipelineError {
    pub fn persistence(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PipelineError::Persistence { path: path.into(), source }
    }

    pub fn corrupt(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        PipelineError::CorruptArtifact { path: path.into(), reason: reason.into() }
    }

    /// Empty-result outcomes are not failures of the pipeline itself
    pub fn is_empty_result(&self) -> bool {
        matches!(self, PipelineError::DataUnavailable(_))
    }
}

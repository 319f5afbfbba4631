//! Artifact Storage - versioned scaler/model persistence
//!
//! Each artifact is a JSON envelope: format version, artifact kind, feature
//! layout stamp, training-run id and a SHA-256 checksum over the payload.
//! Anything that fails those checks is reported as `CorruptArtifact`.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::logic::error::{PipelineError, PipelineResult};
use crate::logic::features::layout::{layout_hash, validate_layout, FEATURE_VERSION};

/// Bump when the envelope or payload encoding changes
pub const ARTIFACT_FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    Scaler,
    Model,
}

/// Envelope metadata, returned alongside the decoded payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactHeader {
    pub format_version: u32,
    pub kind: ArtifactKind,
    pub feature_version: u8,
    pub layout_hash: u32,
    /// Scaler and model of one training run share this id
    pub model_id: Uuid,
    pub saved_at: DateTime<Utc>,
    pub host: String,
    pub checksum: String,
}

/// Payload is kept as raw JSON text so the checksum covers the exact bytes on disk
#[derive(Debug, Serialize, Deserialize)]
struct ArtifactEnvelope {
    header: ArtifactHeader,
    payload: Box<RawValue>,
}

fn checksum(payload: &RawValue) -> String {
    hex::encode(Sha256::digest(payload.get().as_bytes()))
}

fn host_name() -> String {
    hostname::get()
        .map(|h| h.to_string_lossy().to_string())
        .unwrap_or_else(|_| "unknown".to_string())
}

// ============================================================================
// SAVE (stage + commit)
// ============================================================================

/// Artifact written to its temp file, not yet visible under its final name
#[derive(Debug)]
pub struct StagedArtifact {
    path: PathBuf,
    tmp_path: PathBuf,
    header: ArtifactHeader,
}

impl StagedArtifact {
    /// Drop the temp file, leaving the target untouched
    pub fn discard(self) {
        if let Err(e) = fs::remove_file(&self.tmp_path) {
            log::debug!("Could not remove {}: {}", self.tmp_path.display(), e);
        }
    }

    /// Move the temp file into place. Any previous target is kept as `.bak`
    /// until the whole commit succeeds.
    fn replace_target(&self) -> PipelineResult<Option<PathBuf>> {
        let backup = if self.path.exists() {
            let backup = self.path.with_extension("json.bak");
            fs::rename(&self.path, &backup).map_err(|e| PipelineError::persistence(&backup, e))?;
            Some(backup)
        } else {
            None
        };

        if let Err(e) = fs::rename(&self.tmp_path, &self.path) {
            if let Some(backup) = &backup {
                restore(backup, &self.path);
            }
            return Err(PipelineError::persistence(&self.path, e));
        }

        Ok(backup)
    }
}

fn restore(backup: &Path, target: &Path) {
    if let Err(e) = fs::rename(backup, target) {
        log::error!("Failed to restore {} from {}: {}", target.display(), backup.display(), e);
    }
}

/// Serialize and write an artifact to `<path>.tmp`
pub fn stage_artifact<T: Serialize>(
    path: &Path,
    kind: ArtifactKind,
    model_id: Uuid,
    payload: &T,
) -> PipelineResult<StagedArtifact> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| PipelineError::persistence(parent, e))?;
    }

    let payload = serde_json::to_string(payload)
        .and_then(RawValue::from_string)
        .map_err(|e| PipelineError::MalformedInput(format!("payload not serializable: {}", e)))?;

    let header = ArtifactHeader {
        format_version: ARTIFACT_FORMAT_VERSION,
        kind,
        feature_version: FEATURE_VERSION,
        layout_hash: layout_hash(),
        model_id,
        saved_at: Utc::now(),
        host: host_name(),
        checksum: checksum(&payload),
    };

    let envelope = ArtifactEnvelope { header: header.clone(), payload };
    let json = serde_json::to_vec_pretty(&envelope)
        .map_err(|e| PipelineError::MalformedInput(format!("envelope not serializable: {}", e)))?;

    let tmp_path = path.with_extension("json.tmp");
    fs::write(&tmp_path, json).map_err(|e| PipelineError::persistence(&tmp_path, e))?;

    Ok(StagedArtifact { path: path.to_path_buf(), tmp_path, header })
}

/// Move staged artifacts into place as one unit.
///
/// If any rename fails, targets already replaced are restored from their
/// backups (or removed when there was none) and remaining temp files dropped.
pub fn commit_artifacts(staged: Vec<StagedArtifact>) -> PipelineResult<Vec<ArtifactHeader>> {
    let mut committed: Vec<(PathBuf, Option<PathBuf>)> = Vec::new();
    let mut headers = Vec::with_capacity(staged.len());
    let mut pending = staged.into_iter();

    while let Some(artifact) = pending.next() {
        match artifact.replace_target() {
            Ok(backup) => {
                committed.push((artifact.path.clone(), backup));
                headers.push(artifact.header);
            }
            Err(e) => {
                artifact.discard();
                pending.by_ref().for_each(StagedArtifact::discard);

                for (target, backup) in committed.iter().rev() {
                    match backup {
                        Some(backup) => restore(backup, target),
                        None => {
                            if let Err(e) = fs::remove_file(target) {
                                log::error!("Failed to remove {}: {}", target.display(), e);
                            }
                        }
                    }
                }
                return Err(e);
            }
        }
    }

    for backup in committed.iter().filter_map(|(_, backup)| backup.as_ref()) {
        if let Err(e) = fs::remove_file(backup) {
            log::debug!("Could not remove {}: {}", backup.display(), e);
        }
    }

    for header in &headers {
        log::debug!("Committed {:?} artifact {}", header.kind, header.model_id);
    }
    Ok(headers)
}

// ============================================================================
// LOAD
// ============================================================================

/// Read and validate an artifact
pub fn load_artifact<T: DeserializeOwned>(path: &Path, kind: ArtifactKind) -> PipelineResult<(ArtifactHeader, T)> {
    let data = match fs::read(path) {
        Ok(data) => data,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(PipelineError::ArtifactMissing(path.to_path_buf()));
        }
        Err(e) => return Err(PipelineError::persistence(path, e)),
    };

    let envelope: ArtifactEnvelope =
        serde_json::from_slice(&data).map_err(|e| PipelineError::corrupt(path, format!("undecodable: {}", e)))?;
    let header = envelope.header;

    if header.format_version != ARTIFACT_FORMAT_VERSION {
        return Err(PipelineError::corrupt(
            path,
            format!("format v{} (expected v{})", header.format_version, ARTIFACT_FORMAT_VERSION),
        ));
    }
    if header.kind != kind {
        return Err(PipelineError::corrupt(path, format!("holds {:?}, expected {:?}", header.kind, kind)));
    }
    validate_layout(header.feature_version, header.layout_hash).map_err(|e| PipelineError::corrupt(path, e.to_string()))?;

    if checksum(&envelope.payload) != header.checksum {
        return Err(PipelineError::corrupt(path, "checksum mismatch"));
    }

    let payload = serde_json::from_str(envelope.payload.get())
        .map_err(|e| PipelineError::corrupt(path, format!("payload: {}", e)))?;

    Ok((header, payload))
}

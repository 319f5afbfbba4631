use std::fs;
use std::path::Path;

use crate::logic::error::{PipelineError, PipelineResult};
use crate::logic::packet::PacketRecord;

/// Write records as a CSV dataset (buffer column names), replacing `path`.
/// Returns the number of rows written.
pub fn write_dataset(path: &Path, records: &[PacketRecord]) -> PipelineResult<usize> {
    if records.is_empty() {
        return Err(PipelineError::DataUnavailable("nothing to export".into()));
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| PipelineError::persistence(parent, e))?;
    }

    let to_io = |e: csv::Error| PipelineError::persistence(path, std::io::Error::new(std::io::ErrorKind::Other, e));

    let mut writer = csv::Writer::from_path(path).map_err(to_io)?;
    for record in records {
        writer.serialize(record).map_err(to_io)?;
    }
    writer.flush().map_err(|e| PipelineError::persistence(path, e))?;

    log::info!("Exported {} packets to {}", records.len(), path.display());
    Ok(records.len())
}

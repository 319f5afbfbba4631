//! CSV dataset reader
//!
//! Accepts Wireshark-style exports (`Time`, `Source`, `Destination`,
//! `Protocol`, `Length`) as well as the buffer's own column names.
//! Header matching is case-insensitive.

use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::Path;

use csv::{ReaderBuilder, StringRecord, Trim};

use super::{DatasetSummary, TrainingDataset};
use crate::logic::error::{PipelineError, PipelineResult};
use crate::logic::packet::PacketRecord;

const LENGTH_COLUMNS: &[&str] = &["length"];
const PROTOCOL_COLUMNS: &[&str] = &["proto", "protocol"];
const TIME_COLUMNS: &[&str] = &["time", "timestamp"];
const SOURCE_COLUMNS: &[&str] = &["source_ip", "source", "src"];
const DEST_COLUMNS: &[&str] = &["dest_ip", "destination", "dst"];

/// Column positions resolved from the header row
#[derive(Debug, Clone, PartialEq, Eq)]
struct ColumnMap {
    length: usize,
    protocol: Option<usize>,
    time: Option<usize>,
    source: Option<usize>,
    dest: Option<usize>,
}

impl ColumnMap {
    fn resolve(headers: &StringRecord) -> PipelineResult<Self> {
        let find = |names: &[&str]| {
            names.iter().find_map(|name| {
                headers.iter().position(|h| h.trim().eq_ignore_ascii_case(name))
            })
        };

        let length = find(LENGTH_COLUMNS)
            .ok_or_else(|| PipelineError::MalformedInput("dataset has no Length column".into()))?;

        Ok(Self {
            length,
            protocol: find(PROTOCOL_COLUMNS),
            time: find(TIME_COLUMNS),
            source: find(SOURCE_COLUMNS),
            dest: find(DEST_COLUMNS),
        })
    }
}

/// Read a dataset file. Missing file or zero rows is `DataUnavailable`.
pub fn read_dataset(path: &Path) -> PipelineResult<TrainingDataset> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            log::warn!("Dataset not found at {}", path.display());
            return Err(PipelineError::DataUnavailable(format!("dataset not found: {}", path.display())));
        }
        Err(e) => return Err(PipelineError::persistence(path, e)),
    };

    let dataset = parse_dataset(file)?;
    if dataset.records.is_empty() {
        log::warn!("Dataset {} has no rows", path.display());
        return Err(PipelineError::DataUnavailable(format!("dataset is empty: {}", path.display())));
    }

    log::info!(
        "Loaded {} packets from {} ({} skipped rows, {} coerced fields)",
        dataset.summary.rows,
        path.display(),
        dataset.summary.skipped_rows,
        dataset.summary.coerced_fields
    );
    Ok(dataset)
}

/// Parse CSV from any reader. Invalid numeric values become 0 and are counted.
pub fn parse_dataset<R: Read>(input: R) -> PipelineResult<TrainingDataset> {
    let mut reader = ReaderBuilder::new().flexible(true).trim(Trim::All).from_reader(input);

    let headers = match reader.headers() {
        Ok(headers) => headers.clone(),
        Err(e) => return Err(PipelineError::MalformedInput(format!("unreadable header row: {}", e))),
    };
    if headers.is_empty() {
        return Ok(TrainingDataset { records: Vec::new(), summary: DatasetSummary::default() });
    }
    let columns = ColumnMap::resolve(&headers)?;

    let mut records = Vec::new();
    let mut summary = DatasetSummary::default();

    for row in reader.records() {
        let row = match row {
            Ok(row) => row,
            Err(e) => {
                log::debug!("Skipping unreadable dataset row: {}", e);
                summary.skipped_rows += 1;
                continue;
            }
        };

        let text = |idx: Option<usize>| idx.and_then(|i| row.get(i)).unwrap_or("").to_string();

        let length = coerce_count(row.get(columns.length), &mut summary.coerced_fields);
        let protocol = match columns.protocol {
            Some(idx) => coerce_count(row.get(idx), &mut summary.coerced_fields).min(u32::MAX as u64) as u32,
            None => 0,
        };

        records.push(PacketRecord::new(
            text(columns.time),
            text(columns.source),
            text(columns.dest),
            protocol,
            length,
        ));
        summary.rows += 1;
    }

    Ok(TrainingDataset { records, summary })
}

/// Non-negative integer from a numeric field ("60", "60.0"); anything else is 0
fn coerce_count(field: Option<&str>, coerced: &mut usize) -> u64 {
    match field.map(str::trim).and_then(|f| f.parse::<f64>().ok()) {
        Some(v) if v.is_finite() && v >= 0.0 => v as u64,
        _ => {
            *coerced += 1;
            0
        }
    }
}

//! Dataset Module - bootstrap training data
//!
//! Reads the tabular capture export used to train the first model and
//! writes buffer snapshots back in the same shape.

pub mod reader;
pub mod export;


use serde::{Deserialize, Serialize};

use crate::logic::packet::PacketRecord;

pub use export::write_dataset;
pub use reader::read_dataset;

/// Parsed dataset plus what had to be repaired on the way in
#[derive(Debug, Clone)]
pub struct TrainingDataset {
    pub records: Vec<PacketRecord>,
    pub summary: DatasetSummary,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetSummary {
    /// Rows turned into records
    pub rows: usize,
    /// Rows the CSV parser could not read at all
    pub skipped_rows: usize,
    /// Missing or invalid numeric fields replaced by 0
    pub coerced_fields: usize,
}

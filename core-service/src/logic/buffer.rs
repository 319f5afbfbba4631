//! Packet Buffer - bounded live-data buffer between capture and serving
//!
//! Quản lý buffer chứa packet records gần nhất.
//! Producer push từ capture thread, serving layer đọc snapshot.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{Duration, Local, NaiveDateTime};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use super::packet::PacketRecord;
use crate::constants::DEFAULT_BUFFER_CAPACITY;

// ============================================================================
// STATE
// ============================================================================

/// Fixed-capacity FIFO of the most recent packet records.
///
/// One mutex guards push and snapshot so readers never see a half-applied
/// eviction. Drop-oldest is the only backpressure: `push` never fails.
#[derive(Debug)]
pub struct PacketBuffer {
    records: Mutex<VecDeque<PacketRecord>>,
    capacity: usize,
    total_pushed: AtomicU64,
    total_evicted: AtomicU64,
}

/// Buffer status information
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BufferStatus {
    pub queue_size: usize,
    pub queue_max_size: usize,
    pub is_full: bool,
    pub is_empty: bool,
    pub total_pushed: u64,
    pub total_evicted: u64,
}

// ============================================================================
// BUFFER OPERATIONS
// ============================================================================

impl PacketBuffer {
    /// Capacity 0 is bumped to 1 so the size invariant stays meaningful.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            records: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
            total_pushed: AtomicU64::new(0),
            total_evicted: AtomicU64::new(0),
        }
    }

    /// Append a record, evicting the oldest first when full
    pub fn push(&self, record: PacketRecord) {
        let mut records = self.records.lock();

        if records.len() >= self.capacity {
            records.pop_front();
            self.total_evicted.fetch_add(1, Ordering::Relaxed);
        }
        records.push_back(record);

        self.total_pushed.fetch_add(1, Ordering::Relaxed);
    }

    /// Ordered copy of everything currently held, oldest first
    pub fn snapshot(&self) -> Vec<PacketRecord> {
        self.records.lock().iter().cloned().collect()
    }

    /// Records with timestamp >= now - window.
    ///
    /// Records whose timestamp does not parse are kept: the live view favors
    /// completeness over precision.
    pub fn recent_since(&self, window: Duration, now: NaiveDateTime) -> Vec<PacketRecord> {
        let cutoff = now - window;
        let snapshot = self.snapshot();
        let mut unparsed = 0usize;

        let recent: Vec<PacketRecord> = snapshot
            .into_iter()
            .filter(|record| match record.parsed_timestamp() {
                Some(ts) => ts >= cutoff,
                None => {
                    unparsed += 1;
                    true
                }
            })
            .collect();

        if unparsed > 0 {
            log::warn!("{} buffered records have unparseable timestamps, kept in window", unparsed);
        }

        recent
    }

    /// Records within the last `window` relative to local wall-clock time
    pub fn recent(&self, window: Duration) -> Vec<PacketRecord> {
        self.recent_since(window, Local::now().naive_local())
    }

    pub fn size(&self) -> usize {
        self.records.lock().len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_full(&self) -> bool {
        self.size() >= self.capacity
    }

    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }

    /// Get buffer status
    pub fn status(&self) -> BufferStatus {
        let size = self.size();

        BufferStatus {
            queue_size: size,
            queue_max_size: self.capacity,
            is_full: size >= self.capacity,
            is_empty: size == 0,
            total_pushed: self.total_pushed.load(Ordering::Relaxed),
            total_evicted: self.total_evicted.load(Ordering::Relaxed),
        }
    }
}

impl Default for PacketBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_BUFFER_CAPACITY)
    }
}

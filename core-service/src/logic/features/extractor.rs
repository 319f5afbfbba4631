//! Feature Extraction - packet records to feature vectors
//!
//! Never fails: malformed inputs degrade to defaults and are logged.

use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};

use super::vector::FeatureVector;
use crate::logic::packet::PacketRecord;

/// Rate assigned to the first packet of a batch
pub const DEFAULT_PACKET_RATE: f64 = 1.0;

/// Smallest time delta used as divisor (seconds)
pub const MIN_TIME_DELTA: f64 = 1e-6;

/// Fallback packet-rate distribution when timestamps are unusable
pub const FALLBACK_RATE_MEAN: f64 = 50.0;
pub const FALLBACK_RATE_STD: f64 = 10.0;

/// Converts ordered packet batches to feature vectors.
///
/// The random source only feeds the packet-rate fallback; seed it for
/// reproducible output.
#[derive(Debug)]
pub struct FeatureExtractor {
    rng: Mutex<StdRng>,
    fallback_batches: AtomicU64,
}

impl FeatureExtractor {
    /// Entropy-seeded extractor
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// Deterministic extractor
    pub fn seeded(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    pub fn with_rng(rng: StdRng) -> Self {
        Self {
            rng: Mutex::new(rng),
            fallback_batches: AtomicU64::new(0),
        }
    }

    /// One vector per record, same order
    pub fn extract(&self, records: &[PacketRecord]) -> Vec<FeatureVector> {
        if records.is_empty() {
            return Vec::new();
        }

        let rates = match packet_rates(records) {
            Some(rates) => rates,
            None => {
                self.fallback_batches.fetch_add(1, Ordering::Relaxed);
                log::warn!(
                    "Unparseable timestamp in batch of {} packets, using synthetic packet rates",
                    records.len()
                );
                self.fallback_rates(records.len())
            }
        };

        records
            .iter()
            .zip(rates)
            .map(|(record, rate)| FeatureVector::new(record.length as f64, record.protocol as f64, rate))
            .collect()
    }

    /// Number of batches that fell back to synthetic packet rates
    pub fn fallback_count(&self) -> u64 {
        self.fallback_batches.load(Ordering::Relaxed)
    }

    fn fallback_rates(&self, n: usize) -> Vec<f64> {
        let normal = match Normal::new(FALLBACK_RATE_MEAN, FALLBACK_RATE_STD) {
            Ok(normal) => normal,
            Err(e) => {
                log::error!("Invalid fallback distribution: {}", e);
                return vec![FALLBACK_RATE_MEAN; n];
            }
        };

        let mut rng = self.rng.lock();
        (0..n).map(|_| normal.sample(&mut *rng)).collect()
    }
}

impl Default for FeatureExtractor {
    fn default() -> Self {
        Self::new()
    }
}

/// Reciprocal time deltas, `None` if any timestamp fails to parse.
///
/// Zero or negative deltas (same-second or out-of-order packets) count as one second.
fn packet_rates(records: &[PacketRecord]) -> Option<Vec<f64>> {
    let times = records
        .iter()
        .map(PacketRecord::parsed_timestamp)
        .collect::<Option<Vec<_>>>()?;

    let mut rates = Vec::with_capacity(times.len());
    rates.push(DEFAULT_PACKET_RATE);

    for pair in times.windows(2) {
        let delta = (pair[1] - pair[0]).num_milliseconds() as f64 / 1000.0;
        let delta = if delta <= 0.0 { 1.0 } else { delta.max(MIN_TIME_DELTA) };
        rates.push(1.0 / delta);
    }

    Some(rates)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn packet(ts: &str, protocol: u32, length: u64) -> PacketRecord {
        PacketRecord::new(ts, "192.168.1.10", "192.168.1.1", protocol, length)
    }

    #[test]
    fn test_empty_batch() {
        let extractor = FeatureExtractor::seeded(1);
        assert!(extractor.extract(&[]).is_empty());
        assert_eq!(extractor.fallback_count(), 0);
    }

    #[test]
    fn test_basic_columns_and_rates() {
        let extractor = FeatureExtractor::seeded(1);
        let records = vec![
            packet("2024-05-01 10:00:00", 6, 60),
            packet("2024-05-01 10:00:02", 17, 1500),
            packet("2024-05-01 10:00:02", 1, 98),
            packet("2024-05-01 10:00:06", 6, 40),
        ];

        let vectors = extractor.extract(&records);
        assert_eq!(vectors.len(), 4);

        assert_eq!(vectors[0], FeatureVector::new(60.0, 6.0, DEFAULT_PACKET_RATE));
        assert_eq!(vectors[1].length, 1500.0);
        assert_eq!(vectors[1].protocol_type, 17.0);
        assert!((vectors[1].packet_rate - 0.5).abs() < 1e-12);
        // same second → delta treated as 1s
        assert!((vectors[2].packet_rate - 1.0).abs() < 1e-12);
        assert!((vectors[3].packet_rate - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_out_of_order_delta() {
        let extractor = FeatureExtractor::seeded(1);
        let records = vec![
            packet("2024-05-01 10:00:05", 6, 60),
            packet("2024-05-01 10:00:01", 6, 60),
        ];
        let vectors = extractor.extract(&records);
        assert!((vectors[1].packet_rate - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_unparseable_timestamp_uses_fallback_column() {
        let extractor = FeatureExtractor::seeded(42);
        let records: Vec<PacketRecord> = (0..200)
            .map(|i| {
                if i == 100 {
                    packet("not a time", 6, 60)
                } else {
                    packet("2024-05-01 10:00:00", 6, 60)
                }
            })
            .collect();

        let vectors = extractor.extract(&records);
        assert_eq!(vectors.len(), 200);
        assert_eq!(extractor.fallback_count(), 1);

        let mean = vectors.iter().map(|v| v.packet_rate).sum::<f64>() / 200.0;
        assert!((mean - FALLBACK_RATE_MEAN).abs() < 3.0, "mean was {}", mean);
        // lengths are untouched by the fallback
        assert!(vectors.iter().all(|v| v.length == 60.0));
    }

    #[test]
    fn test_fallback_is_reproducible_with_seed() {
        let records = vec![packet("bad", 6, 1), packet("bad", 6, 2)];
        let a = FeatureExtractor::seeded(7).extract(&records);
        let b = FeatureExtractor::seeded(7).extract(&records);
        assert_eq!(a, b);
    }
}

//! Stats Aggregator - summary counts over scored records
//!
//! Pure functions; callers pass a scored snapshot, nothing is cached.

use std::cmp::Reverse;

use serde::{Deserialize, Serialize};

use super::model::ScoredRecord;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Stats {
    pub total_packets: usize,
    pub normal_packets: usize,
    pub anomaly_packets: usize,
    /// 0..=100, unrounded; display precision is the client's concern
    pub anomaly_percentage: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct HourlyBucket {
    pub hour: u32,
    pub normal: usize,
    pub anomaly: usize,
}

/// Totals and anomaly percentage. An empty batch is all zeros, never NaN.
pub fn aggregate(scored: &[ScoredRecord]) -> Stats {
    let total_packets = scored.len();
    let anomaly_packets = scored.iter().filter(|r| r.is_anomaly()).count();

    let anomaly_percentage = if total_packets == 0 {
        0.0
    } else {
        anomaly_packets as f64 / total_packets as f64 * 100.0
    };

    Stats {
        total_packets,
        normal_packets: total_packets - anomaly_packets,
        anomaly_packets,
        anomaly_percentage,
    }
}

/// 24 zero-filled buckets indexed by hour of day.
/// Records whose timestamp does not parse are left out.
pub fn hourly_buckets(scored: &[ScoredRecord]) -> Vec<HourlyBucket> {
    let mut buckets: Vec<HourlyBucket> = (0..24).map(|hour| HourlyBucket { hour, ..Default::default() }).collect();
    let mut skipped = 0usize;

    for record in scored {
        match record.record.hour() {
            Some(hour) => {
                let bucket = &mut buckets[hour as usize];
                if record.is_anomaly() {
                    bucket.anomaly += 1;
                } else {
                    bucket.normal += 1;
                }
            }
            None => skipped += 1,
        }
    }

    if skipped > 0 {
        log::debug!("{} records without a parseable hour left out of hourly stats", skipped);
    }

    buckets
}

/// Last `limit` anomalies in arrival order
pub fn recent_anomalies(scored: &[ScoredRecord], limit: usize) -> Vec<ScoredRecord> {
    let anomalies: Vec<&ScoredRecord> = scored.iter().filter(|r| r.is_anomaly()).collect();
    let start = anomalies.len().saturating_sub(limit);
    anomalies[start..].iter().map(|r| (*r).clone()).collect()
}

/// Every anomaly, newest timestamp first. Unparseable timestamps sort last.
pub fn anomaly_history(scored: &[ScoredRecord]) -> Vec<ScoredRecord> {
    let mut anomalies: Vec<ScoredRecord> = scored.iter().filter(|r| r.is_anomaly()).cloned().collect();
    // stable: equal timestamps keep arrival order
    anomalies.sort_by_key(|r| Reverse(r.record.parsed_timestamp()));
    anomalies
}

/// Last `limit` scored records in arrival order
pub fn tail(scored: &[ScoredRecord], limit: usize) -> Vec<ScoredRecord> {
    scored[scored.len().saturating_sub(limit)..].to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::model::Label;
    use crate::logic::packet::PacketRecord;

    fn scored(timestamp: &str, length: u64, label: Label) -> ScoredRecord {
        ScoredRecord {
            record: PacketRecord::new(timestamp, "192.168.1.10", "10.0.0.1", 6, length),
            prediction: label,
            anomaly_score: if label.is_anomaly() { -0.1 } else { 0.1 },
        }
    }

    #[test]
    fn test_aggregate_counts() {
        let batch = vec![
            scored("2024-05-01 02:00:00", 1, Label::Normal),
            scored("2024-05-01 02:10:00", 2, Label::Normal),
            scored("2024-05-01 14:00:00", 3, Label::Anomaly),
        ];

        let stats = aggregate(&batch);
        assert_eq!(stats.total_packets, 3);
        assert_eq!(stats.normal_packets, 2);
        assert_eq!(stats.anomaly_packets, 1);
        assert!((stats.anomaly_percentage - 100.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_aggregate_empty() {
        let stats = aggregate(&[]);
        assert_eq!(stats, Stats::default());
        assert!(!stats.anomaly_percentage.is_nan());
    }

    #[test]
    fn test_hourly_buckets() {
        let batch = vec![
            scored("2024-05-01 02:00:00", 1, Label::Normal),
            scored("2024-05-01 02:59:59", 2, Label::Normal),
            scored("2024-05-01 14:30:00", 3, Label::Anomaly),
            scored("not a time", 4, Label::Anomaly),
        ];

        let buckets = hourly_buckets(&batch);
        assert_eq!(buckets.len(), 24);
        assert_eq!(buckets[2], HourlyBucket { hour: 2, normal: 2, anomaly: 0 });
        assert_eq!(buckets[14], HourlyBucket { hour: 14, normal: 0, anomaly: 1 });

        let counted: usize = buckets.iter().map(|b| b.normal + b.anomaly).sum();
        assert_eq!(counted, 3);
        assert!(buckets.iter().enumerate().all(|(i, b)| b.hour == i as u32));
    }

    #[test]
    fn test_hourly_buckets_empty() {
        let buckets = hourly_buckets(&[]);
        assert_eq!(buckets.len(), 24);
        assert!(buckets.iter().all(|b| b.normal == 0 && b.anomaly == 0));
    }

    #[test]
    fn test_recent_anomalies_keeps_last() {
        let batch: Vec<ScoredRecord> = (0..15)
            .map(|i| scored("2024-05-01 10:00:00", i, if i % 2 == 0 { Label::Anomaly } else { Label::Normal }))
            .collect();

        let recent = recent_anomalies(&batch, 3);
        let lengths: Vec<u64> = recent.iter().map(|r| r.record.length).collect();
        assert_eq!(lengths, vec![10, 12, 14]);
        assert_eq!(recent_anomalies(&batch, 100).len(), 8);
    }

    #[test]
    fn test_anomaly_history_newest_first() {
        let batch = vec![
            scored("2024-05-01 09:00:00", 1, Label::Anomaly),
            scored("garbage", 2, Label::Anomaly),
            scored("2024-05-01 11:00:00", 3, Label::Anomaly),
            scored("2024-05-01 12:00:00", 4, Label::Normal),
            scored("2024-05-01 10:00:00", 5, Label::Anomaly),
        ];

        let lengths: Vec<u64> = anomaly_history(&batch).iter().map(|r| r.record.length).collect();
        assert_eq!(lengths, vec![3, 5, 1, 2]);
    }

    #[test]
    fn test_tail() {
        let batch: Vec<ScoredRecord> = (0..5).map(|i| scored("2024-05-01 10:00:00", i, Label::Normal)).collect();
        let lengths: Vec<u64> = tail(&batch, 2).iter().map(|r| r.record.length).collect();
        assert_eq!(lengths, vec![3, 4]);
        assert_eq!(tail(&batch, 50).len(), 5);
        assert!(tail(&[], 50).is_empty());
    }
}

//! Prediction output types

use serde::{Deserialize, Serialize};

use crate::logic::packet::PacketRecord;

/// Binary outlier label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Label {
    Normal,
    Anomaly,
}

impl Label {
    pub fn is_anomaly(self) -> bool {
        self == Label::Anomaly
    }
}

/// Labels and decision scores for one batch, index-aligned with the input.
///
/// Scores follow the forest convention: higher is more normal, negative is anomalous.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Predictions {
    pub labels: Vec<Label>,
    pub scores: Vec<f64>,
}

impl Predictions {
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn anomaly_count(&self) -> usize {
        self.labels.iter().filter(|l| l.is_anomaly()).count()
    }

    /// Attach predictions to the records they were computed from
    pub fn attach(self, records: &[PacketRecord]) -> Vec<ScoredRecord> {
        records
            .iter()
            .zip(self.labels)
            .zip(self.scores)
            .map(|((record, prediction), anomaly_score)| ScoredRecord {
                record: record.clone(),
                prediction,
                anomaly_score,
            })
            .collect()
    }
}

/// Packet record with its model verdict. Serialized flat for the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredRecord {
    #[serde(flatten)]
    pub record: PacketRecord,
    #[serde(rename = "Status")]
    pub prediction: Label,
    #[serde(rename = "Anomaly_Score")]
    pub anomaly_score: f64,
}

impl ScoredRecord {
    pub fn is_anomaly(&self) -> bool {
        self.prediction.is_anomaly()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attach_and_serialize_flat() {
        let records = vec![PacketRecord::new("2024-05-01 10:00:00", "a", "b", 6, 1500)];
        let predictions = Predictions {
            labels: vec![Label::Anomaly],
            scores: vec![-0.12],
        };
        assert_eq!(predictions.anomaly_count(), 1);

        let scored = predictions.attach(&records);
        let json = serde_json::to_value(&scored[0]).unwrap();
        assert_eq!(json["Status"], "Anomaly");
        assert_eq!(json["Anomaly_Score"], -0.12);
        assert_eq!(json["Length"], 1500);
    }
}

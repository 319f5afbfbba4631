//! Feature Vector - per-packet model input

use serde::{Deserialize, Serialize};

use super::layout::{FEATURE_COUNT, FEATURE_LAYOUT};

/// Fixed-width numeric features for one packet, in FEATURE_LAYOUT order
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FeatureVector {
    pub length: f64,
    pub protocol_type: f64,
    pub packet_rate: f64,
}

impl FeatureVector {
    pub fn new(length: f64, protocol_type: f64, packet_rate: f64) -> Self {
        Self { length, protocol_type, packet_rate }
    }

    /// Values as array, ordered by FEATURE_LAYOUT
    pub fn as_array(&self) -> [f64; FEATURE_COUNT] {
        [self.length, self.protocol_type, self.packet_rate]
    }

    /// JSON form for debug logging
    pub fn to_log_entry(&self) -> serde_json::Value {
        serde_json::json!({
            "feature_version": super::layout::FEATURE_VERSION,
            "named_values": FEATURE_LAYOUT.iter()
                .zip(self.as_array().iter())
                .map(|(name, value)| (name.to_string(), *value))
                .collect::<std::collections::HashMap<_, _>>(),
        })
    }
}

impl From<[f64; FEATURE_COUNT]> for FeatureVector {
    fn from(values: [f64; FEATURE_COUNT]) -> Self {
        Self::new(values[0], values[1], values[2])
    }
}

/// Rows for scaler/forest input
pub fn feature_matrix(vectors: &[FeatureVector]) -> Vec<[f64; FEATURE_COUNT]> {
    vectors.iter().map(FeatureVector::as_array).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_array_order_matches_layout() {
        let vector = FeatureVector::new(1500.0, 6.0, 2.5);
        let values = vector.as_array();
        for (name, value) in FEATURE_LAYOUT.iter().zip(values) {
            assert_eq!(vector.to_log_entry()["named_values"][*name], value);
        }
    }

    #[test]
    fn test_from_array() {
        let vector: FeatureVector = [1.0, 2.0, 3.0].into();
        assert_eq!(vector.as_array(), [1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_to_log_entry() {
        let log = FeatureVector::new(60.0, 17.0, 1.0).to_log_entry();
        assert_eq!(log["named_values"]["protocol_type"], 17.0);
    }
}

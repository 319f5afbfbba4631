//! Features Module - Feature Extraction Engine
//!
//! Tách logic trích xuất features từ packet records.
//! Layout is versioned so persisted models can detect schema changes.

pub mod layout;
pub mod vector;
pub mod extractor;


// Re-export common types
pub use layout::{FEATURE_COUNT, FEATURE_LAYOUT, FEATURE_VERSION, layout_hash, LayoutInfo};
pub use vector::{feature_matrix, FeatureVector};
pub use extractor::FeatureExtractor;

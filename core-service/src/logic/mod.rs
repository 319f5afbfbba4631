//! Logic Module - capture, buffering, features, model and stats
//!
//! Pipeline: capture → buffer → features → model → stats.
//! Serving layers only talk to `buffer`, `model` and `stats`.

// Shared plumbing
pub mod config;
pub mod error;
pub mod packet;

// Pipeline stages
pub mod capture;
pub mod buffer;
pub mod features;
pub mod model;
pub mod stats;

// Training data
pub mod dataset;

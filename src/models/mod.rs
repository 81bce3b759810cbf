//! Data models and structures for the speedtest exporter

pub mod config;
pub mod measurement;

// Re-export main model types
pub use config::Config;
pub use measurement::{bits_per_second, MeasurementResult, TesterConfig};

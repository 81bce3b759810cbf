//! Speed test measurement capability

pub mod http;

use crate::{error::Result, models::MeasurementResult};
use async_trait::async_trait;

pub use http::HttpSpeedTester;

/// Runs one full speed test per call
///
/// Implementations are fixed at construction and safe to call concurrently;
/// every call produces an independent result. Any failure aborts the whole
/// measurement.
#[async_trait]
pub trait SpeedTester: Send + Sync {
    /// Select a server, download, upload and report the totals
    async fn measure(&self) -> Result<MeasurementResult>;
}

//! Turns one speed test into the fixed set of metric samples

use crate::{
    error::Result,
    logging::Logger,
    models::MeasurementResult,
    tester::SpeedTester,
};
use std::sync::Arc;

/// Name, help text and value of one unlabelled gauge
#[derive(Debug, Clone, PartialEq)]
pub struct MetricSample {
    pub name: &'static str,
    pub help: &'static str,
    pub value: f64,
}

impl MetricSample {
    pub fn new(name: &'static str, help: &'static str, value: f64) -> Self {
        Self { name, help, value }
    }
}

pub const DOWNLOAD_SPEED: &str = "download_speed_bps";
pub const UPLOAD_SPEED: &str = "upload_speed_bps";
pub const PING: &str = "ping_ms";
pub const BYTES_RECEIVED: &str = "bytes_received";
pub const BYTES_SENT: &str = "bytes_sent";

/// Every sample name in emission order
pub const SAMPLE_NAMES: [&str; 5] =
    [DOWNLOAD_SPEED, UPLOAD_SPEED, PING, BYTES_RECEIVED, BYTES_SENT];

/// Samples for a finished measurement, in emission order
pub fn samples_from(result: &MeasurementResult) -> Vec<MetricSample> {
    vec![
        MetricSample::new(DOWNLOAD_SPEED, "Download speed (bit/s)", result.download_bps),
        MetricSample::new(UPLOAD_SPEED, "Upload speed (bit/s)", result.upload_bps),
        MetricSample::new(PING, "Latency (ms)", result.ping_ms),
        MetricSample::new(
            BYTES_RECEIVED,
            "Bytes received during test",
            result.bytes_received as f64,
        ),
        MetricSample::new(BYTES_SENT, "Bytes sent during test", result.bytes_sent as f64),
    ]
}

/// Runs a fresh measurement on every collection and never caches
pub struct SpeedtestCollector {
    tester: Arc<dyn SpeedTester>,
    logger: Logger,
}

impl SpeedtestCollector {
    pub fn new(tester: Arc<dyn SpeedTester>) -> Self {
        Self {
            tester,
            logger: Logger::quiet("collector"),
        }
    }

    pub fn with_logger(mut self, logger: Logger) -> Self {
        self.logger = logger;
        self
    }

    /// Measure once and return all five samples, or the measurement error
    pub async fn collect(&self) -> Result<Vec<MetricSample>> {
        let result = self.tester.measure().await?;

        self.logger.debug(&format!(
            "Measured {:.2} Mbit/s down, {:.2} Mbit/s up",
            result.download_mbps(),
            result.upload_mbps()
        ))
        .measurement(&result)
        .log()
        .await;

        Ok(samples_from(&result))
    }
}

//! Speed test result and tester configuration models

use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::time::Duration;
use url::Url;

/// Outcome of one full speed test
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasurementResult {
    /// Download throughput in bit/s
    pub download_bps: f64,
    /// Upload throughput in bit/s
    pub upload_bps: f64,
    /// Round-trip latency to the selected server in milliseconds
    pub ping_ms: f64,
    /// Payload bytes uploaded during the test
    pub bytes_sent: u64,
    /// Payload bytes downloaded during the test
    pub bytes_received: u64,
    /// Server the test ran against, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server: Option<String>,
}

impl MeasurementResult {
    /// Create a result; negative or non-finite rates are clamped to zero
    pub fn new(
        download_bps: f64,
        upload_bps: f64,
        ping_ms: f64,
        bytes_sent: u64,
        bytes_received: u64,
    ) -> Self {
        Self {
            download_bps: non_negative(download_bps),
            upload_bps: non_negative(upload_bps),
            ping_ms: non_negative(ping_ms),
            bytes_sent,
            bytes_received,
            server: None,
        }
    }

    /// Attach the server the result was measured against
    pub fn with_server<S: Into<String>>(mut self, server: S) -> Self {
        self.server = Some(server.into());
        self
    }

    /// Download speed in Mbit/s for human-readable logs
    pub fn download_mbps(&self) -> f64 {
        self.download_bps / 1_000_000.0
    }

    /// Upload speed in Mbit/s for human-readable logs
    pub fn upload_mbps(&self) -> f64 {
        self.upload_bps / 1_000_000.0
    }
}

fn non_negative(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

/// Throughput in bit/s for `bytes` transferred over `elapsed`
pub fn bits_per_second(bytes: u64, elapsed: Duration) -> f64 {
    let secs = elapsed.as_secs_f64();
    if secs <= 0.0 {
        return 0.0;
    }
    (bytes as f64 * 8.0) / secs
}

/// Settings a tester is built with; never changes after construction
#[derive(Debug, Clone, PartialEq)]
pub struct TesterConfig {
    /// Local address outgoing connections bind to
    pub source_address: Option<IpAddr>,
    /// Upper bound for each network operation
    pub timeout: Duration,
    /// Candidate servers, the one with the lowest latency is used
    pub servers: Vec<Url>,
    /// Payload sizes fetched during the download phase
    pub download_sizes: Vec<u64>,
    /// Payload sizes posted during the upload phase
    pub upload_sizes: Vec<u64>,
    /// Latency samples taken per candidate during server selection
    pub ping_samples: u32,
}

impl Default for TesterConfig {
    fn default() -> Self {
        Self {
            source_address: None,
            timeout: crate::defaults::DEFAULT_TIMEOUT,
            servers: crate::defaults::DEFAULT_SPEEDTEST_SERVERS
                .iter()
                .filter_map(|s| Url::parse(s).ok())
                .collect(),
            download_sizes: crate::defaults::DEFAULT_DOWNLOAD_SIZES.to_vec(),
            upload_sizes: crate::defaults::DEFAULT_UPLOAD_SIZES.to_vec(),
            ping_samples: crate::defaults::DEFAULT_PING_SAMPLES,
        }
    }
}

impl TesterConfig {
    pub fn with_servers(mut self, servers: Vec<Url>) -> Self {
        self.servers = servers;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_source_address(mut self, source_address: Option<IpAddr>) -> Self {
        self.source_address = source_address;
        self
    }

    pub fn with_transfer_sizes(mut self, download_sizes: Vec<u64>, upload_sizes: Vec<u64>) -> Self {
        self.download_sizes = download_sizes;
        self.upload_sizes = upload_sizes;
        self
    }
}

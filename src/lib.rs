//! Speedtest Exporter
//!
//! A Prometheus exporter that runs a full network speed test (server
//! selection, download, upload) every time it is scraped and reports the
//! result as a fixed set of gauges.

pub mod cli;
pub mod collector;
pub mod config;
pub mod error;
pub mod exposition;
pub mod logging;
pub mod models;
pub mod server;
pub mod tester;
pub mod types;

// Re-export commonly used types
pub use collector::{MetricSample, SpeedtestCollector};
pub use error::{AppError, Result};
pub use models::{Config, MeasurementResult, TesterConfig};
pub use server::{ExporterServer, ServerConfig};
pub use tester::{HttpSpeedTester, SpeedTester};
pub use types::ServeMode;

/// Application version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const PKG_NAME: &str = env!("CARGO_PKG_NAME");
pub const PKG_DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

/// Build information set by build.rs
pub const BUILD_TIME: &str = env!("BUILD_TIME");
pub const TARGET_TRIPLE: &str = env!("TARGET_TRIPLE");
pub const GIT_COMMIT: Option<&str> = option_env!("GIT_COMMIT");

/// Default configuration values
pub mod defaults {
    use std::time::Duration;

    pub const DEFAULT_LISTEN_ADDRESS: &str = "0.0.0.0";
    pub const DEFAULT_PORT: u16 = 9516;
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
    pub const DEFAULT_PROBE_PATH: &str = "/probe";
    pub const DEFAULT_STATIC_DIR_NAME: &str = "static";
    pub const DEFAULT_SPEEDTEST_SERVERS: &[&str] = &["https://speed.cloudflare.com"];
    pub const DEFAULT_DOWNLOAD_SIZES: &[u64] = &[100_000, 1_000_000, 10_000_000, 25_000_000];
    pub const DEFAULT_UPLOAD_SIZES: &[u64] = &[100_000, 1_000_000, 10_000_000];
    pub const DEFAULT_PING_SAMPLES: u32 = 3;
    pub const DEFAULT_ENABLE_COLOR: bool = true;
    pub const MAX_TIMEOUT_SECONDS: u64 = 300;
}

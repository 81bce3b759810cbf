//! Command-line interface

use crate::logging::LogFormat;
use crate::types::ServeMode;
use clap::{ArgAction, Parser};
use std::path::PathBuf;

/// Speedtest Exporter - runs a network speed test on every Prometheus scrape
#[derive(Parser, Debug, Clone)]
#[command(name = "speedtest-exporter")]
#[command(version, about, long_about = None)]
#[command(disable_version_flag = true)]
pub struct Cli {
    /// Address to listen on
    #[arg(short, long, value_name = "ADDRESS")]
    pub address: Option<String>,

    /// Port to listen on [default: 9516]
    #[arg(short, long, value_name = "PORT")]
    pub port: Option<u16>,

    /// Show version information and exit
    #[arg(short = 'v', long, action = ArgAction::Version)]
    pub version: Option<bool>,

    /// HTTP layout: "probe" (metrics at /probe, status page elsewhere) or "metrics" (metrics at /)
    #[arg(long, value_name = "MODE", value_parser = parse_serve_mode)]
    pub mode: Option<ServeMode>,

    /// Timeout in seconds for each speed test network operation [default: 10]
    #[arg(short, long, value_name = "SECONDS", value_parser = parse_timeout)]
    pub timeout: Option<u64>,

    /// Local IP address speed test connections bind to
    #[arg(long, value_name = "IP")]
    pub source_address: Option<String>,

    /// Speed test server base URL (can be used multiple times)
    #[arg(long = "server", value_name = "URL", action = ArgAction::Append)]
    pub servers: Vec<String>,

    /// Directory the status page is served from
    #[arg(long, value_name = "DIR")]
    pub static_dir: Option<PathBuf>,

    /// Log line format: console, json or compact
    #[arg(long, value_name = "FORMAT", value_parser = parse_log_format)]
    pub log_format: Option<LogFormat>,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    /// Log server selection and each probe's lifecycle
    #[arg(long)]
    pub verbose: bool,

    /// Log everything, including each accepted connection
    #[arg(long)]
    pub debug: bool,
}

impl Cli {
    /// Check if colors should be enabled
    pub fn use_colors(&self) -> bool {
        !self.no_color && supports_color()
    }
}

fn parse_serve_mode(s: &str) -> Result<ServeMode, String> {
    s.parse::<ServeMode>().map_err(|e| e.to_string())
}

fn parse_log_format(s: &str) -> Result<LogFormat, String> {
    s.parse::<LogFormat>().map_err(|e| e.to_string())
}

/// Parse timeout from seconds string
fn parse_timeout(s: &str) -> Result<u64, String> {
    // Reject strings with leading + sign or other invalid formats
    if s.starts_with('+') || s.starts_with("0x") || s.starts_with("0X") {
        return Err(format!("Invalid timeout: {}", s));
    }

    s.parse::<u64>()
        .map_err(|_| format!("Invalid timeout: {}", s))
        .and_then(|secs| {
            if secs == 0 {
                Err("Timeout must be greater than 0".to_string())
            } else if secs > crate::defaults::MAX_TIMEOUT_SECONDS {
                Err(format!("Timeout cannot exceed {} seconds", crate::defaults::MAX_TIMEOUT_SECONDS))
            } else {
                Ok(secs)
            }
        })
}

/// Check if the terminal supports color output
fn supports_color() -> bool {
    if let Ok(term) = std::env::var("TERM") {
        if term == "dumb" {
            return false;
        }
    }

    if std::env::var("NO_COLOR").is_ok() {
        return false;
    }

    if std::env::var("FORCE_COLOR").is_ok() {
        return true;
    }

    #[cfg(unix)]
    {
        true
    }
    #[cfg(not(unix))]
    {
        false
    }
}

//! Environment variable handling and .env file management

use crate::error::Result;
use std::path::Path;

/// Environment variable configuration manager
pub struct EnvManager;

impl EnvManager {
    /// Load .env file if it exists, returns whether one was loaded
    pub fn load_env_file() -> Result<bool> {
        Self::load_env_file_from(Path::new(".env"))
    }

    /// Load a specific env file if it exists
    pub fn load_env_file_from(path: &Path) -> Result<bool> {
        if !path.exists() {
            return Ok(false);
        }

        dotenv::from_path(path)?;

        Ok(true)
    }

    /// Get list of all supported environment variables with descriptions
    pub fn get_supported_env_vars() -> Vec<(&'static str, &'static str, &'static str)> {
        vec![
            ("LISTEN_ADDRESS", "Address to listen on", "0.0.0.0"),
            ("LISTEN_PORT", "Port to listen on", "9516"),
            ("SERVE_MODE", "probe (metrics at /probe) or metrics (metrics at /)", "probe"),
            ("TIMEOUT_SECONDS", "Speed test timeout in seconds (1-300)", "10"),
            ("SOURCE_ADDRESS", "Local IP speed test connections bind to", "192.168.1.10"),
            ("SPEEDTEST_SERVERS", "Comma-separated speed test server URLs", "https://speed.cloudflare.com"),
            ("STATIC_DIR", "Directory the status page is served from", "/usr/share/speedtest-exporter/static"),
            ("ENABLE_COLOR", "Enable colored output", "true"),
            ("LOG_FORMAT", "console, json or compact", "json"),
        ]
    }

    /// Display environment variable help
    pub fn display_env_help() -> String {
        let mut help = String::new();
        help.push_str("Supported Environment Variables:\n\n");

        for (var, description, example) in Self::get_supported_env_vars() {
            help.push_str(&format!("  {:<18} {}\n", var, description));
            help.push_str(&format!("  {:<18} Example: {}\n\n", "", example));
        }

        help.push_str("Configuration Priority (highest to lowest):\n");
        help.push_str("  1. Command-line arguments\n");
        help.push_str("  2. Environment variables\n");
        help.push_str("  3. .env file values\n");
        help.push_str("  4. Default values\n");

        help
    }
}

//! Configuration data model and validation

use crate::logging::LogFormat;
use crate::models::TesterConfig;
use crate::server::ServerConfig;
use crate::types::{AppError, Result, ServeMode};
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use url::Url;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Address the HTTP server listens on
    #[serde(default = "default_listen_address")]
    pub listen_address: String,

    /// Port the HTTP server listens on
    #[serde(default = "default_port")]
    pub port: u16,

    /// Probe+static layout or metrics-only layout
    #[serde(default)]
    pub mode: ServeMode,

    /// Timeout for each speed test network operation
    #[serde(default = "default_timeout_secs")]
    pub timeout_seconds: u64,

    /// Local IP address speed test connections bind to
    #[serde(default)]
    pub source_address: Option<String>,

    /// Candidate speed test server base URLs
    #[serde(default = "default_servers")]
    pub servers: Vec<String>,

    /// Directory the status page is served from
    #[serde(default)]
    pub static_dir: Option<PathBuf>,

    /// Enable colored terminal output
    #[serde(default = "default_enable_color")]
    pub enable_color: bool,

    /// Log line format
    #[serde(default)]
    pub log_format: LogFormat,

    /// Enable verbose output
    #[serde(default)]
    pub verbose: bool,

    /// Enable debug output
    #[serde(default)]
    pub debug: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_address: default_listen_address(),
            port: default_port(),
            mode: ServeMode::default(),
            timeout_seconds: default_timeout_secs(),
            source_address: None,
            servers: default_servers(),
            static_dir: None,
            enable_color: default_enable_color(),
            log_format: LogFormat::default(),
            verbose: false,
            debug: false,
        }
    }
}

impl Config {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Get timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    /// Validate the configuration and return the first error found
    pub fn validate(&self) -> Result<()> {
        if IpAddr::from_str(&self.listen_address).is_err() {
            return Err(AppError::config(format!("Invalid listen address: {}", self.listen_address)));
        }

        if self.port == 0 {
            return Err(AppError::config("Port must be greater than 0"));
        }

        if self.timeout_seconds == 0 {
            return Err(AppError::config("Timeout must be greater than 0"));
        }

        if self.timeout_seconds > crate::defaults::MAX_TIMEOUT_SECONDS {
            return Err(AppError::config(format!(
                "Timeout cannot exceed {} seconds",
                crate::defaults::MAX_TIMEOUT_SECONDS
            )));
        }

        if let Some(source) = &self.source_address {
            if IpAddr::from_str(source).is_err() {
                return Err(AppError::config(format!("Invalid source address: {}", source)));
            }
        }

        if self.servers.is_empty() {
            return Err(AppError::config("At least one speed test server is required"));
        }

        for server in &self.servers {
            if server.is_empty() {
                return Err(AppError::config("Speed test server URL cannot be empty"));
            }

            match Url::parse(server) {
                Ok(parsed) => {
                    if parsed.scheme() != "http" && parsed.scheme() != "https" {
                        return Err(AppError::config(format!("Speed test server must use HTTP or HTTPS: {}", server)));
                    }
                }
                Err(e) => {
                    return Err(AppError::config(format!("Invalid speed test server URL '{}': {}", server, e)));
                }
            }
        }

        Ok(())
    }

    /// Socket address the server binds to
    pub fn listen_socket_addr(&self) -> Result<SocketAddr> {
        let ip = IpAddr::from_str(&self.listen_address)?;
        Ok(SocketAddr::new(ip, self.port))
    }

    /// Build the tester configuration from these settings
    pub fn tester_config(&self) -> Result<TesterConfig> {
        let source_address = match &self.source_address {
            Some(source) => Some(IpAddr::from_str(source)?),
            None => None,
        };

        let servers = self.servers
            .iter()
            .map(|s| Url::parse(s).map_err(AppError::from))
            .collect::<Result<Vec<_>>>()?;

        Ok(TesterConfig::default()
            .with_servers(servers)
            .with_timeout(self.timeout())
            .with_source_address(source_address))
    }

    /// Build the HTTP server configuration from these settings
    pub fn server_config(&self) -> Result<ServerConfig> {
        Ok(ServerConfig {
            listen: self.listen_socket_addr()?,
            mode: self.mode,
            static_dir: self.resolve_static_dir(),
        })
    }

    /// Static root: explicit setting, else `static/` next to the executable,
    /// else `./static`
    pub fn resolve_static_dir(&self) -> PathBuf {
        if let Some(dir) = &self.static_dir {
            return dir.clone();
        }

        let beside_exe = std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(|p| p.join(crate::defaults::DEFAULT_STATIC_DIR_NAME)));

        match beside_exe {
            Some(dir) if dir.is_dir() => dir,
            _ => PathBuf::from(crate::defaults::DEFAULT_STATIC_DIR_NAME),
        }
    }

    /// Merge environment variables into this configuration
    pub fn merge_from_env(&mut self) -> Result<()> {
        if let Ok(address) = std::env::var("LISTEN_ADDRESS") {
            self.listen_address = address.trim().to_string();
        }

        if let Ok(port) = std::env::var("LISTEN_PORT") {
            self.port = port.trim().parse()
                .map_err(|e| AppError::config(format!("Invalid LISTEN_PORT value '{}': {}", port, e)))?;
        }

        if let Ok(mode) = std::env::var("SERVE_MODE") {
            self.mode = mode.parse()?;
        }

        if let Ok(timeout) = std::env::var("TIMEOUT_SECONDS") {
            self.timeout_seconds = timeout.trim().parse()
                .map_err(|e| AppError::config(format!("Invalid TIMEOUT_SECONDS value '{}': {}", timeout, e)))?;
        }

        if let Ok(source) = std::env::var("SOURCE_ADDRESS") {
            let source = source.trim();
            self.source_address = if source.is_empty() { None } else { Some(source.to_string()) };
        }

        if let Ok(servers) = std::env::var("SPEEDTEST_SERVERS") {
            self.servers = servers
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }

        if let Ok(dir) = std::env::var("STATIC_DIR") {
            if !dir.trim().is_empty() {
                self.static_dir = Some(PathBuf::from(dir.trim()));
            }
        }

        if let Ok(enable_color) = std::env::var("ENABLE_COLOR") {
            self.enable_color = enable_color.trim().parse()
                .map_err(|e| AppError::config(format!("Invalid ENABLE_COLOR value '{}': {}", enable_color, e)))?;
        }

        if let Ok(format) = std::env::var("LOG_FORMAT") {
            self.log_format = format.parse()?;
        }

        Ok(())
    }
}

// Default value functions for serde
fn default_listen_address() -> String {
    crate::defaults::DEFAULT_LISTEN_ADDRESS.to_string()
}

fn default_port() -> u16 {
    crate::defaults::DEFAULT_PORT
}

fn default_timeout_secs() -> u64 {
    crate::defaults::DEFAULT_TIMEOUT.as_secs()
}

fn default_servers() -> Vec<String> {
    crate::defaults::DEFAULT_SPEEDTEST_SERVERS
        .iter()
        .map(|&s| s.to_string())
        .collect()
}

fn default_enable_color() -> bool {
    crate::defaults::DEFAULT_ENABLE_COLOR
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.port, 9516);
        assert_eq!(config.mode, ServeMode::Probe);
        assert_eq!(config.timeout(), Duration::from_secs(10));
    }

    #[test]
    fn test_invalid_listen_address() {
        let config = Config { listen_address: "localhost:80".to_string(), ..Default::default() };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_port_invalid() {
        let config = Config { port: 0, ..Default::default() };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_timeout_bounds() {
        let config = Config { timeout_seconds: 0, ..Default::default() };
        assert!(config.validate().is_err());

        let config = Config { timeout_seconds: 301, ..Default::default() };
        assert!(config.validate().is_err());

        let config = Config { timeout_seconds: 300, ..Default::default() };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_source_address() {
        let config = Config { source_address: Some("eth0".to_string()), ..Default::default() };
        assert!(config.validate().is_err());

        let config = Config { source_address: Some("192.168.1.1".to_string()), ..Default::default() };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_server_validation() {
        let config = Config { servers: vec![], ..Default::default() };
        assert!(config.validate().is_err());

        let config = Config { servers: vec!["ftp://speed.example.net".to_string()], ..Default::default() };
        assert!(config.validate().is_err());

        let config = Config { servers: vec!["not a url".to_string()], ..Default::default() };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_tester_config_derivation() {
        let config = Config {
            timeout_seconds: 30,
            source_address: Some("10.0.0.2".to_string()),
            servers: vec!["http://a.example.net".to_string(), "https://b.example.net".to_string()],
            ..Default::default()
        };

        let tester = config.tester_config().unwrap();
        assert_eq!(tester.timeout, Duration::from_secs(30));
        assert_eq!(tester.source_address, Some("10.0.0.2".parse().unwrap()));
        assert_eq!(tester.servers.len(), 2);
        assert_eq!(tester.servers[1].host_str(), Some("b.example.net"));
    }

    #[test]
    fn test_server_config_derivation() {
        let config = Config {
            listen_address: "127.0.0.1".to_string(),
            port: 8080,
            mode: ServeMode::Metrics,
            static_dir: Some(PathBuf::from("/srv/status")),
            ..Default::default()
        };

        let server = config.server_config().unwrap();
        assert_eq!(server.listen, "127.0.0.1:8080".parse().unwrap());
        assert_eq!(server.mode, ServeMode::Metrics);
        assert_eq!(server.static_dir, PathBuf::from("/srv/status"));
    }

    #[test]
    fn test_config_deserializes_with_defaults() {
        let config: Config = serde_json::from_str(r#"{"port": 8080, "mode": "metrics"}"#).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.mode, ServeMode::Metrics);
        assert_eq!(config.listen_address, "0.0.0.0");
        assert_eq!(config.servers, vec!["https://speed.cloudflare.com".to_string()]);
    }
}

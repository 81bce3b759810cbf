//! Configuration parsing from CLI arguments and environment variables

use crate::{
    cli::Cli,
    config::env::EnvManager,
    error::Result,
    models::Config,
};

/// Configuration parser that combines CLI arguments with environment variables
pub struct ConfigParser {
    cli: Cli,
    load_env_file: bool,
}

impl ConfigParser {
    /// Create a new configuration parser with CLI arguments
    pub fn new(cli: Cli) -> Self {
        Self { cli, load_env_file: true }
    }

    /// Skip reading `.env` from the working directory
    pub fn without_env_file(mut self) -> Self {
        self.load_env_file = false;
        self
    }

    /// Parse and build the complete configuration
    pub fn parse(&self) -> Result<Config> {
        let mut config = Config::default();

        if self.load_env_file {
            EnvManager::load_env_file()?;
        }

        config.merge_from_env()?;
        self.apply_cli_overrides(&mut config);
        config.validate()?;

        Ok(config)
    }

    /// Apply CLI argument overrides to configuration
    fn apply_cli_overrides(&self, config: &mut Config) {
        if let Some(address) = &self.cli.address {
            config.listen_address = address.clone();
        }

        if let Some(port) = self.cli.port {
            config.port = port;
        }

        if let Some(mode) = self.cli.mode {
            config.mode = mode;
        }

        if let Some(timeout) = self.cli.timeout {
            config.timeout_seconds = timeout;
        }

        if let Some(source) = &self.cli.source_address {
            config.source_address = Some(source.clone());
        }

        if !self.cli.servers.is_empty() {
            config.servers = self.cli.servers.clone();
        }

        if let Some(dir) = &self.cli.static_dir {
            config.static_dir = Some(dir.clone());
        }

        if let Some(format) = self.cli.log_format {
            config.log_format = format;
        }

        if self.cli.no_color {
            config.enable_color = false;
        }

        // CLI-only flags
        config.verbose = self.cli.verbose;
        config.debug = self.cli.debug;
    }
}

/// Convenience function to load complete configuration from CLI arguments
pub fn load_config(cli: Cli) -> Result<Config> {
    ConfigParser::new(cli).parse()
}

/// Display configuration summary for debug purposes
pub fn display_config_summary(config: &Config) -> String {
    let mut summary = Vec::new();

    summary.push(format!("Listen: {}:{}", config.listen_address, config.port));
    summary.push(format!("Mode: {} (metrics at {})", config.mode, config.mode.probe_path()));
    summary.push(format!("Timeout: {}s", config.timeout_seconds));
    summary.push(format!(
        "Source Address: {}",
        config.source_address.as_deref().unwrap_or("(system default)")
    ));
    summary.push(format!("Servers: {}", config.servers.join(", ")));
    summary.push(format!("Static Dir: {}", config.resolve_static_dir().display()));
    summary.push(format!("Color Output: {}", config.enable_color));
    summary.push(format!("Verbose: {}", config.verbose));
    summary.push(format!("Debug: {}", config.debug));

    summary.join("\n")
}

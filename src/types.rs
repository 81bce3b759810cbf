//! Type definitions and aliases

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// Re-export commonly used types
pub use crate::error::{AppError, Result};

/// How the HTTP surface is laid out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServeMode {
    /// Metrics at `/probe`, static status page for every other path
    #[default]
    Probe,
    /// Metrics at `/`, nothing else
    Metrics,
}

impl ServeMode {
    /// Path that triggers a measurement in this mode
    pub fn probe_path(&self) -> &'static str {
        match self {
            ServeMode::Probe => crate::defaults::DEFAULT_PROBE_PATH,
            ServeMode::Metrics => "/",
        }
    }

    /// Whether non-probe paths are served from the static directory
    pub fn serves_static(&self) -> bool {
        matches!(self, ServeMode::Probe)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ServeMode::Probe => "probe",
            ServeMode::Metrics => "metrics",
        }
    }
}

impl fmt::Display for ServeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ServeMode {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "probe" => Ok(ServeMode::Probe),
            "metrics" | "single" => Ok(ServeMode::Metrics),
            other => Err(AppError::parse(format!(
                "Invalid serve mode '{}': expected 'probe' or 'metrics'",
                other
            ))),
        }
    }
}

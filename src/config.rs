//! Configuration management for Turnstile.

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

use crate::error::{Result, TurnstileError};

const HOUR_MS: u64 = 3_600_000;
const DAY_MS: u64 = 86_400_000;

/// Main configuration for a Turnstile deployment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Sweep scheduling configuration
    #[serde(default)]
    pub sweep: SweepConfig,

    /// Named quota policies
    #[serde(default = "default_quotas")]
    pub quotas: Vec<QuotaConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sweep: SweepConfig::default(),
            quotas: default_quotas(),
        }
    }
}

/// Sweep scheduling configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepConfig {
    /// Seconds between sweep passes
    #[serde(default = "default_sweep_period")]
    pub period_secs: u64,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            period_secs: default_sweep_period(),
        }
    }
}

fn default_sweep_period() -> u64 {
    3600
}

/// A named quota policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuotaConfig {
    /// Name collaborators look the limiter up by
    pub name: String,
    /// Window length in milliseconds
    pub interval_ms: u64,
    /// Admissions allowed per window
    pub max_requests: u32,
}

/// The stock quotas.
///
/// Collaborators depend on these literal names and parameters, so they
/// double as the compatibility baseline for deployments that ship no
/// configuration file.
fn default_quotas() -> Vec<QuotaConfig> {
    vec![
        QuotaConfig {
            name: "colorimetry".to_string(),
            interval_ms: DAY_MS,
            max_requests: 10,
        },
        QuotaConfig {
            name: "outfits".to_string(),
            interval_ms: DAY_MS,
            max_requests: 30,
        },
        QuotaConfig {
            name: "api".to_string(),
            interval_ms: HOUR_MS,
            max_requests: 100,
        },
        QuotaConfig {
            name: "closet".to_string(),
            interval_ms: HOUR_MS,
            max_requests: 50,
        },
    ]
}

impl Config {
    /// Load configuration from a YAML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!(path = %path.display(), "Loading quota configuration");

        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    /// Load configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml)
            .map_err(|e| TurnstileError::Config(format!("Failed to parse config: {}", e)))
    }
}

//! Configuration management for shipwright
//!
//! Settings are loaded from environment variables with fallbacks for
//! anything unset. Per-build options come from the command line; this only
//! covers how the tool itself runs.
//!
//! # Environment Variables
//!
//! - `SHIPWRIGHT_DOCKER_BIN`: Container engine binary - default: "docker"
//! - `SHIPWRIGHT_GIT_BIN`: Git binary used to resolve build info - default: "git"
//! - `SHIPWRIGHT_DEFAULT_BRANCH`: Branch tagged as latest - default: "master"
//! - `SHIPWRIGHT_PROGRESS_INTERVAL_MS`: Spinner tick interval - default: "3000"
//! - `SHIPWRIGHT_LOG_LEVEL`: Logging level - default: "info"
//! - `SHIPWRIGHT_RUNTIME_VERSION`: Runtime version reported to the LTS gate - default: "unknown"
//! - `SHIPWRIGHT_RUNTIME_LTS`: Whether that runtime is an LTS release (true|false) - default: "true"
//!
//! # Example
//!
//! ```no_run
//! use shipwright::ShipwrightConfig;
//!
//! let config = ShipwrightConfig::default();
//! config.validate().expect("Invalid configuration");
//! println!("{}", config);
//! ```

use crate::info::RuntimeInfo;
use std::env;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_DOCKER_BIN: &str = "docker";
const DEFAULT_GIT_BIN: &str = "git";
const DEFAULT_BRANCH: &str = "master";
const DEFAULT_PROGRESS_INTERVAL_MS: u64 = 3000;
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_RUNTIME_VERSION: &str = "unknown";
const DEFAULT_RUNTIME_LTS: bool = true;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Configuration validation failed
    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),

    /// Failed to parse configuration value
    #[error("Failed to parse {field}: {error}")]
    ParseError { field: String, error: String },
}

/// Main configuration structure for shipwright
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShipwrightConfig {
    pub docker_binary: String,
    pub git_binary: String,
    /// Branch whose builds get the `latest` and version tags
    pub default_branch: String,
    pub progress_interval_ms: u64,
    /// Logging level (trace, debug, info, warn, error)
    pub log_level: String,
    pub runtime_version: String,
    pub runtime_lts: bool,
}

impl Default for ShipwrightConfig {
    fn default() -> Self {
        let docker_binary =
            env::var("SHIPWRIGHT_DOCKER_BIN").unwrap_or_else(|_| DEFAULT_DOCKER_BIN.to_string());

        let git_binary =
            env::var("SHIPWRIGHT_GIT_BIN").unwrap_or_else(|_| DEFAULT_GIT_BIN.to_string());

        let default_branch =
            env::var("SHIPWRIGHT_DEFAULT_BRANCH").unwrap_or_else(|_| DEFAULT_BRANCH.to_string());

        let progress_interval_ms = env::var("SHIPWRIGHT_PROGRESS_INTERVAL_MS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(DEFAULT_PROGRESS_INTERVAL_MS);

        let log_level = env::var("SHIPWRIGHT_LOG_LEVEL")
            .unwrap_or_else(|_| DEFAULT_LOG_LEVEL.to_string())
            .to_lowercase();

        let runtime_version = env::var("SHIPWRIGHT_RUNTIME_VERSION")
            .unwrap_or_else(|_| DEFAULT_RUNTIME_VERSION.to_string());

        let runtime_lts = env::var("SHIPWRIGHT_RUNTIME_LTS")
            .ok()
            .and_then(|v| v.parse::<bool>().ok())
            .unwrap_or(DEFAULT_RUNTIME_LTS);

        Self {
            docker_binary,
            git_binary,
            default_branch,
            progress_interval_ms,
            log_level,
            runtime_version,
            runtime_lts,
        }
    }
}

impl ShipwrightConfig {
    /// Validates the configuration
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a binary or branch name is blank, the
    /// progress interval is outside 100ms..=60s, or the log level is unknown.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.docker_binary.trim().is_empty() {
            return Err(ConfigError::ValidationFailed(
                "Docker binary cannot be empty".to_string(),
            ));
        }
        if self.git_binary.trim().is_empty() {
            return Err(ConfigError::ValidationFailed(
                "Git binary cannot be empty".to_string(),
            ));
        }
        if self.default_branch.trim().is_empty() {
            return Err(ConfigError::ValidationFailed(
                "Default branch cannot be empty".to_string(),
            ));
        }

        if !(100..=60_000).contains(&self.progress_interval_ms) {
            return Err(ConfigError::ValidationFailed(format!(
                "Progress interval must be between 100ms and 60s, got {}ms",
                self.progress_interval_ms
            )));
        }

        match self.log_level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => {
                return Err(ConfigError::ValidationFailed(format!(
                    "Invalid log level: {}. Valid options: trace, debug, info, warn, error",
                    self.log_level
                )))
            }
        }

        Ok(())
    }

    pub fn progress_interval(&self) -> Duration {
        Duration::from_millis(self.progress_interval_ms)
    }

    pub fn runtime(&self) -> RuntimeInfo {
        RuntimeInfo {
            version: self.runtime_version.clone(),
            is_lts: self.runtime_lts,
        }
    }

    /// Parses a `KEY=VALUE` pair, as used for build arguments
    pub fn parse_key_value(field: &str, raw: &str) -> Result<(String, String), ConfigError> {
        match raw.split_once('=') {
            Some((key, value)) if !key.trim().is_empty() => {
                Ok((key.trim().to_string(), value.to_string()))
            }
            _ => Err(ConfigError::ParseError {
                field: field.to_string(),
                error: format!("expected KEY=VALUE, got '{}'", raw),
            }),
        }
    }
}

impl fmt::Display for ShipwrightConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Shipwright Configuration:")?;
        writeln!(f, "  Docker Binary: {}", self.docker_binary)?;
        writeln!(f, "  Git Binary: {}", self.git_binary)?;
        writeln!(f, "  Default Branch: {}", self.default_branch)?;
        writeln!(f, "  Progress Interval: {}ms", self.progress_interval_ms)?;
        writeln!(f, "  Log Level: {}", self.log_level)?;
        writeln!(
            f,
            "  Runtime: {} (LTS: {})",
            self.runtime_version, self.runtime_lts
        )?;
        Ok(())
    }
}

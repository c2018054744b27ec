//! Structured logging setup for shipwright
//!
//! Everything goes to stderr through a `tracing` subscriber so the console
//! stays readable while docker output streams through. The level comes from
//! the command line, then `SHIPWRIGHT_LOG_LEVEL`; `RUST_LOG` directives are
//! layered on top when set.
//!
//! # Example
//!
//! ```no_run
//! use shipwright::util::logging;
//! use tracing::info;
//!
//! logging::init_logging(logging::config_from_env(None));
//! info!(image = "acme/api", "Building");
//! ```

use std::env;
use std::sync::Once;
use tracing::Level;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Ensures logging is only initialized once
static INIT: Once = Once::new();

/// Configuration for logging initialization
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Minimum log level to display
    pub level: Level,

    /// Use JSON output format (for CI log collectors)
    pub use_json: bool,

    /// Include the module target (e.g., shipwright::pipeline) in logs
    pub include_target: bool,

    /// Include file and line number information
    pub include_location: bool,

    /// Include thread ID and name in logs
    pub include_thread_ids: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            use_json: false,
            include_target: true,
            include_location: false,
            include_thread_ids: false,
        }
    }
}

/// Picks the effective level: an explicit level wins, then `verbose`
/// (debug) or `quiet` (error), then `fallback`.
pub fn resolve_level(explicit: Option<&str>, verbose: bool, quiet: bool, fallback: &str) -> Level {
    if let Some(level) = explicit {
        parse_level(level)
    } else if verbose {
        Level::DEBUG
    } else if quiet {
        Level::ERROR
    } else {
        parse_level(fallback)
    }
}

/// Parses a log level from a string, case-insensitively
///
/// Unknown values fall back to `Level::INFO` with a warning on stderr.
///
/// ```
/// use shipwright::util::logging::parse_level;
/// use tracing::Level;
///
/// assert_eq!(parse_level("debug"), Level::DEBUG);
/// assert_eq!(parse_level("WARN"), Level::WARN);
/// assert_eq!(parse_level("loud"), Level::INFO);
/// ```
pub fn parse_level(level_str: &str) -> Level {
    match level_str.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => {
            eprintln!(
                "Invalid log level '{}', defaulting to INFO. Valid levels: trace, debug, info, warn, error",
                level_str
            );
            Level::INFO
        }
    }
}

fn build_filter(level: Level) -> EnvFilter {
    let filter = EnvFilter::from_default_env();
    match format!("shipwright={}", level).parse() {
        Ok(directive) => filter.add_directive(directive),
        Err(_) => filter,
    }
}

/// Initializes the logging system; later calls are ignored
pub fn init_logging(config: LoggingConfig) {
    INIT.call_once(|| {
        let filter = build_filter(config.level);

        if config.use_json {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .json()
                        .with_writer(std::io::stderr)
                        .with_target(config.include_target)
                        .with_file(config.include_location)
                        .with_line_number(config.include_location)
                        .with_thread_ids(config.include_thread_ids)
                        .with_thread_names(config.include_thread_ids),
                )
                .init();
        } else {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .with_writer(std::io::stderr)
                        .with_target(config.include_target)
                        .with_file(config.include_location)
                        .with_line_number(config.include_location)
                        .with_thread_ids(config.include_thread_ids)
                        .with_thread_names(config.include_thread_ids),
                )
                .init();
        }
    });
}

/// Reads `SHIPWRIGHT_LOG_JSON` and combines it with `level`, or with
/// `SHIPWRIGHT_LOG_LEVEL` when no level is given
pub fn config_from_env(level: Option<Level>) -> LoggingConfig {
    let level = level.unwrap_or_else(|| {
        let level_str = env::var("SHIPWRIGHT_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
        parse_level(&level_str)
    });

    let use_json = env::var("SHIPWRIGHT_LOG_JSON")
        .ok()
        .and_then(|v| v.parse::<bool>().ok())
        .unwrap_or(false);

    LoggingConfig {
        level,
        use_json,
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("trace"), Level::TRACE);
        assert_eq!(parse_level("debug"), Level::DEBUG);
        assert_eq!(parse_level("info"), Level::INFO);
        assert_eq!(parse_level("warn"), Level::WARN);
        assert_eq!(parse_level("error"), Level::ERROR);
    }

    #[test]
    fn test_parse_level_case_insensitive() {
        assert_eq!(parse_level("TRACE"), Level::TRACE);
        assert_eq!(parse_level("Debug"), Level::DEBUG);
    }

    #[test]
    fn test_parse_level_invalid() {
        assert_eq!(parse_level("invalid"), Level::INFO);
        assert_eq!(parse_level(""), Level::INFO);
    }

    #[test]
    fn test_resolve_level_precedence() {
        assert_eq!(resolve_level(Some("warn"), true, false, "info"), Level::WARN);
        assert_eq!(resolve_level(None, true, false, "info"), Level::DEBUG);
        assert_eq!(resolve_level(None, false, true, "info"), Level::ERROR);
        assert_eq!(resolve_level(None, false, false, "trace"), Level::TRACE);
    }

    #[test]
    fn test_default_config() {
        let config = LoggingConfig::default();
        assert_eq!(config.level, Level::INFO);
        assert!(!config.use_json);
        assert!(config.include_target);
        assert!(!config.include_location);
    }

    #[test]
    #[serial]
    fn test_config_from_env() {
        std::env::set_var("SHIPWRIGHT_LOG_LEVEL", "warn");
        std::env::set_var("SHIPWRIGHT_LOG_JSON", "true");

        let config = config_from_env(None);
        assert_eq!(config.level, Level::WARN);
        assert!(config.use_json);

        let config = config_from_env(Some(Level::TRACE));
        assert_eq!(config.level, Level::TRACE);

        std::env::remove_var("SHIPWRIGHT_LOG_LEVEL");
        std::env::remove_var("SHIPWRIGHT_LOG_JSON");
    }
}

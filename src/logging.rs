//! Logging configuration shared across binaries.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing_subscriber::EnvFilter;

pub const LOG_SETTINGS_FILE: &str = "config/logging.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Filter directive used when RUST_LOG is unset (e.g. "info", "geoguess=debug")
    pub level: String,
    /// Include module paths in log lines
    pub with_target: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            with_target: false,
        }
    }
}

impl LogConfig {
    pub fn load() -> Self {
        let path = Path::new(LOG_SETTINGS_FILE);
        if !path.exists() {
            return Self::default();
        }
        match fs::read_to_string(path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_default(),
            Err(_) => Self::default(),
        }
    }

    pub fn enabled_from_args(args: &[String]) -> bool {
        args.iter().any(|arg| arg == "--debug-log")
    }

    pub fn load_with_args(args: &[String]) -> Self {
        let mut config = Self::load();
        if Self::enabled_from_args(args) {
            config.level = "debug".to_string();
        }
        config
    }

    /// RUST_LOG wins over the configured level
    pub fn filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(&self.level))
            .unwrap_or_else(|_| EnvFilter::new("warn"))
    }
}

/// Install the global tracing subscriber (stderr). Safe to call twice.
pub fn init_logging(config: &LogConfig) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(config.filter())
        .with_target(config.with_target)
        .with_writer(std::io::stderr)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_flag_raises_level() {
        let args = vec!["geoguess".to_string(), "--debug-log".to_string()];
        assert!(LogConfig::enabled_from_args(&args));
        assert_eq!(LogConfig::load_with_args(&args).level, "debug");
    }

    #[test]
    fn test_init_twice_is_harmless() {
        let config = LogConfig::default();
        init_logging(&config);
        init_logging(&config);
    }
}

//! Environment-backed runtime configuration.

use std::env;

/// Runtime settings for the tapgate binary.
///
/// Everything comes from the environment so the binary runs unchanged in
/// a container:
///
/// - `TAPGATE_DATABASE` - SQLite database path (default `tapgate.db`)
/// - `TAPGATE_DEVICE` - device identifier used by the demo (default `gate-1`)
/// - `RUST_LOG` - log filter, consumed directly by `tracing-subscriber`
#[derive(Debug, Clone)]
pub struct Config {
    pub database_path: String,
    pub demo_device: String,
}

impl Config {
    /// Load configuration from the environment
    pub fn from_env() -> Self {
        Self {
            database_path: env::var("TAPGATE_DATABASE").unwrap_or_else(|_| "tapgate.db".to_string()),
            demo_device: env::var("TAPGATE_DEVICE").unwrap_or_else(|_| "gate-1".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_without_env() {
        // Only meaningful when the variables are unset, which is the
        // normal test environment.
        if env::var("TAPGATE_DATABASE").is_err() && env::var("TAPGATE_DEVICE").is_err() {
            let config = Config::from_env();
            assert_eq!(config.database_path, "tapgate.db");
            assert_eq!(config.demo_device, "gate-1");
        }
    }
}

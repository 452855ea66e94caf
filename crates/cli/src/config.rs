//! CLI configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `ARBATAI_DATA_DIR` - Directory holding the shared basket (default: `.arbatai`)
//! - `ARBATAI_CART_KEY` - Storage key of the basket (default: `arbatai_cart_v1`)
//! - `ARBATAI_WATCH_INTERVAL_MS` - Poll interval for `cart watch` (default: 500)

use std::path::PathBuf;
use std::time::Duration;

use arbatai_core::DEFAULT_STORAGE_KEY;
use thiserror::Error;

const DEFAULT_DATA_DIR: &str = ".arbatai";
const DEFAULT_WATCH_INTERVAL_MS: u64 = 500;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// CLI configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliConfig {
    /// Directory containing the basket file
    pub data_dir: PathBuf,
    /// Key the basket is stored under
    pub storage_key: String,
    /// How often `cart watch` checks for changes
    pub watch_interval: Duration,
}

impl CliConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set to an invalid value.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get_or_default =
            |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let data_dir = PathBuf::from(get_or_default("ARBATAI_DATA_DIR", DEFAULT_DATA_DIR));

        let storage_key = get_or_default("ARBATAI_CART_KEY", DEFAULT_STORAGE_KEY);
        if storage_key.trim().is_empty() {
            return Err(ConfigError::InvalidEnvVar(
                "ARBATAI_CART_KEY".to_string(),
                "must not be empty".to_string(),
            ));
        }

        let interval_ms = get_or_default(
            "ARBATAI_WATCH_INTERVAL_MS",
            &DEFAULT_WATCH_INTERVAL_MS.to_string(),
        )
        .parse::<u64>()
        .map_err(|e| {
            ConfigError::InvalidEnvVar("ARBATAI_WATCH_INTERVAL_MS".to_string(), e.to_string())
        })?;
        if interval_ms == 0 {
            return Err(ConfigError::InvalidEnvVar(
                "ARBATAI_WATCH_INTERVAL_MS".to_string(),
                "must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            data_dir,
            storage_key,
            watch_interval: Duration::from_millis(interval_ms),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<CliConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        CliConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[]).unwrap();
        assert_eq!(config.data_dir, PathBuf::from(".arbatai"));
        assert_eq!(config.storage_key, "arbatai_cart_v1");
        assert_eq!(config.watch_interval, Duration::from_millis(500));
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("ARBATAI_DATA_DIR", "/var/lib/arbatai"),
            ("ARBATAI_CART_KEY", "staging_cart"),
            ("ARBATAI_WATCH_INTERVAL_MS", "250"),
        ])
        .unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/var/lib/arbatai"));
        assert_eq!(config.storage_key, "staging_cart");
        assert_eq!(config.watch_interval, Duration::from_millis(250));
    }

    #[test]
    fn test_invalid_interval() {
        assert!(matches!(
            load(&[("ARBATAI_WATCH_INTERVAL_MS", "soon")]),
            Err(ConfigError::InvalidEnvVar(name, _)) if name == "ARBATAI_WATCH_INTERVAL_MS"
        ));
        assert!(load(&[("ARBATAI_WATCH_INTERVAL_MS", "0")]).is_err());
    }

    #[test]
    fn test_blank_key_rejected() {
        assert!(load(&[("ARBATAI_CART_KEY", "  ")]).is_err());
    }
}

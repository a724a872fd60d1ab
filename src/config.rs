//! Client configuration
//!
//! TOML file under the platform config directory holding the backend URL,
//! the auth nonce, and tuning knobs. Missing file means defaults; a file
//! with out-of-range values is clamped with a warning rather than rejected.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::constants::{config, http, preview, validation};

fn default_base_url() -> String {
    http::DEFAULT_BASE_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    http::REQUEST_TIMEOUT_SECS
}

fn default_debounce_ms() -> u64 {
    preview::DEBOUNCE_MS
}

fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Nonce sent with every request; obtained from the admin page
    #[serde(default)]
    pub nonce: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            nonce: String::new(),
            timeout_secs: default_timeout_secs(),
            debounce_ms: default_debounce_ms(),
            log_level: default_log_level(),
        }
    }
}

impl ClientConfig {
    fn config_path() -> PathBuf {
        let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push(config::APP_DIR);
        path.push(config::FILENAME);
        path
    }

    /// Clamp tuning values into safe ranges, warning about each adjustment
    fn validate_and_clamp(&mut self) {
        if self.timeout_secs == 0 {
            warn!("timeout_secs is 0, using default");
            self.timeout_secs = default_timeout_secs();
        } else if self.timeout_secs > validation::MAX_TIMEOUT_SECS {
            warn!(
                timeout_secs = self.timeout_secs,
                max = validation::MAX_TIMEOUT_SECS,
                "timeout_secs exceeds maximum, clamping"
            );
            self.timeout_secs = validation::MAX_TIMEOUT_SECS;
        }

        if self.debounce_ms > validation::MAX_DEBOUNCE_MS {
            warn!(
                debounce_ms = self.debounce_ms,
                max = validation::MAX_DEBOUNCE_MS,
                "debounce_ms exceeds maximum, clamping"
            );
            self.debounce_ms = validation::MAX_DEBOUNCE_MS;
        }

        while self.base_url.ends_with('/') {
            self.base_url.pop();
        }
    }

    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let mut config = match fs::read_to_string(path) {
            Ok(contents) => toml::from_str::<ClientConfig>(&contents)
                .context(format!("Failed to parse config file {}", path.display()))?,
            Err(_) => {
                info!(path = %path.display(), "no config file found, using defaults");
                ClientConfig::default()
            }
        };
        config.validate_and_clamp();
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .context(format!("Failed to create config directory: {}", parent.display()))?;
        }
        let contents = toml::to_string_pretty(self).context("Failed to serialize config to TOML")?;
        fs::write(path, contents)
            .context(format!("Failed to write config file to {}", path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = ClientConfig::load_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.base_url, http::DEFAULT_BASE_URL);
        assert_eq!(config.timeout_secs, http::REQUEST_TIMEOUT_SECS);
        assert!(config.nonce.is_empty());
    }

    #[test]
    fn test_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let config = ClientConfig {
            base_url: "http://example.test/wp-json/stylesync/v1".to_string(),
            nonce: "abc123".to_string(),
            timeout_secs: 30,
            debounce_ms: 150,
            log_level: "debug".to_string(),
        };
        config.save_to(&path).unwrap();

        let loaded = ClientConfig::load_from(&path).unwrap();
        assert_eq!(loaded.base_url, config.base_url);
        assert_eq!(loaded.nonce, "abc123");
        assert_eq!(loaded.timeout_secs, 30);
        assert_eq!(loaded.debounce_ms, 150);
    }

    #[test]
    fn test_out_of_range_values_are_clamped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "base_url = \"http://h/v1///\"\ntimeout_secs = 9999\ndebounce_ms = 999999\n",
        )
        .unwrap();

        let config = ClientConfig::load_from(&path).unwrap();
        assert_eq!(config.base_url, "http://h/v1");
        assert_eq!(config.timeout_secs, validation::MAX_TIMEOUT_SECS);
        assert_eq!(config.debounce_ms, validation::MAX_DEBOUNCE_MS);
    }

    #[test]
    fn test_invalid_toml_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "base_url = [not toml").unwrap();
        assert!(ClientConfig::load_from(&path).is_err());
    }
}

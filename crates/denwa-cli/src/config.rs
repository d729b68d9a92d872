//! Configuration management for Denwa CLI
//!
//! Stores the API key and server URL in ~/.config/denwa/config.toml.
//! `DENWA_BASE_URL` and `DENWA_API_KEY` from the environment (or a `.env`
//! file) take precedence over the file.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

const CONFIG_DIR: &str = "denwa";
const CONFIG_FILE: &str = "config.toml";

const BASE_URL_ENV: &str = "DENWA_BASE_URL";
const API_KEY_ENV: &str = "DENWA_API_KEY";

/// CLI Configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_base_url(),
        }
    }
}

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Could not determine config directory")?
            .join(CONFIG_DIR);
        Ok(config_dir)
    }

    /// Get the config file path
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join(CONFIG_FILE))
    }

    /// Load the stored config (or defaults) without environment overrides
    pub fn load_file() -> Result<Self> {
        let path = Self::config_path()?;

        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config from {:?}", path))?;

        toml::from_str(&content).with_context(|| "Failed to parse config file")
    }

    /// Load config from file, then apply environment overrides
    pub fn load() -> Result<Self> {
        let mut config = Self::load_file()?;
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Override settings from a key lookup; blank values are ignored
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = get(BASE_URL_ENV) {
            self.base_url = url;
        }
        if let Some(key) = get(API_KEY_ENV) {
            self.api_key = Some(key);
        }
    }

    /// Save config to file
    pub fn save(&self) -> Result<()> {
        let dir = Self::config_dir()?;
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create config directory {:?}", dir))?;

        let path = Self::config_path()?;
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(&path, content)
            .with_context(|| format!("Failed to write config to {:?}", path))?;

        Ok(())
    }

    /// Set API key
    pub fn set_api_key(&mut self, key: String) {
        self.api_key = Some(key);
    }

    /// Set server URL
    pub fn set_base_url(&mut self, url: String) {
        self.base_url = url.trim_end_matches('/').to_string();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_environment_overrides_file_values() {
        let mut config: Config = toml::from_str("api_key = \"from_file\"").unwrap();
        assert_eq!(config.base_url, "http://localhost:8000");

        let env = HashMap::from([
            (BASE_URL_ENV, "https://denwa.example"),
            (API_KEY_ENV, "from_env"),
        ]);
        config.apply_overrides(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.base_url, "https://denwa.example");
        assert_eq!(config.api_key.as_deref(), Some("from_env"));
    }

    #[test]
    fn test_blank_overrides_are_ignored() {
        let mut config = Config::default();
        config.set_api_key("stored".to_string());

        config.apply_overrides(|_| Some("  ".to_string()));

        assert_eq!(config.api_key.as_deref(), Some("stored"));
        assert_eq!(config.base_url, "http://localhost:8000");
    }

    #[test]
    fn test_base_url_is_normalized() {
        let mut config = Config::default();
        config.set_base_url("https://denwa.example/".to_string());
        assert_eq!(config.base_url, "https://denwa.example");
    }
}

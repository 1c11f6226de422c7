//! Application configuration management.
//!
//! This module handles loading and saving the client configuration, which
//! includes the API base URL and the last email used to sign in.
//!
//! Configuration is stored at `~/.config/counsel/config.json`. The API base
//! URL can be overridden with the `COUNSEL_API_URL` environment variable,
//! which takes precedence over the file.

use std::path::PathBuf;

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Application name used for the config directory path
const APP_NAME: &str = "counsel";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Production API base URL
const DEFAULT_API_BASE_URL: &str = "https://api.counsel.app";

/// Environment variable overriding the API base URL
const API_URL_ENV: &str = "COUNSEL_API_URL";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    pub last_email: Option<String>,
}

fn default_api_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            last_email: None,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        let mut config: Config = if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            serde_json::from_str(&contents)?
        } else {
            Self::default()
        };

        if let Ok(url) = std::env::var(API_URL_ENV) {
            if !url.is_empty() {
                config.api_base_url = url;
            }
        }

        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_production() {
        let config = Config::default();
        assert_eq!(config.api_base_url, DEFAULT_API_BASE_URL);
        assert!(config.last_email.is_none());
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let config: Config = serde_json::from_str("{}").expect("empty object should parse");
        assert_eq!(config.api_base_url, DEFAULT_API_BASE_URL);
        assert!(config.last_email.is_none());
    }

    #[test]
    fn roundtrips_through_json() {
        let config = Config {
            api_base_url: "http://localhost:8080".to_string(),
            last_email: Some("amina@example.org".to_string()),
        };
        let json = serde_json::to_string(&config).expect("config should serialize");
        let parsed: Config = serde_json::from_str(&json).expect("config should parse back");
        assert_eq!(parsed.api_base_url, config.api_base_url);
        assert_eq!(parsed.last_email, config.last_email);
    }
}

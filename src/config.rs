//! Configuration management

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Environment variable that overrides the saved API key
pub const API_KEY_ENV: &str = "TMDB_API_KEY";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default = "default_image_base")]
    pub image_base: String,
    #[serde(default = "default_atlas_url")]
    pub atlas_url: String,
    // Excludes low-sample outliers from the rating sort
    #[serde(default = "default_min_vote_count")]
    pub min_vote_count: u32,
    #[serde(default = "default_timeout")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_true")]
    pub dark_mode: bool,
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

fn default_api_base() -> String {
    "https://api.themoviedb.org/3".to_string()
}

fn default_image_base() -> String {
    "https://image.tmdb.org/t/p".to_string()
}

fn default_atlas_url() -> String {
    "https://cdn.jsdelivr.net/npm/world-atlas@2/countries-110m.json".to_string()
}

fn default_min_vote_count() -> u32 {
    220
}

fn default_timeout() -> u64 {
    30
}

fn default_true() -> bool {
    true
}

fn default_log_filter() -> String {
    "info".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_base: default_api_base(),
            image_base: default_image_base(),
            atlas_url: default_atlas_url(),
            min_vote_count: default_min_vote_count(),
            request_timeout_secs: default_timeout(),
            dark_mode: true,
            log_filter: default_log_filter(),
        }
    }
}

impl AppConfig {
    fn config_path() -> PathBuf {
        let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push("world_cinema_map");
        fs::create_dir_all(&path).ok();
        path.push("config.json");
        path
    }

    /// Load saved config (or defaults), then apply environment overrides
    pub fn load() -> Self {
        let path = Self::config_path();

        let mut config = if path.exists() {
            fs::read_to_string(&path)
                .ok()
                .and_then(|content| Self::from_json(&content))
                .unwrap_or_default()
        } else {
            Self::default()
        };

        config.apply_env_key(std::env::var(API_KEY_ENV).ok());
        config
    }

    pub fn from_json(content: &str) -> Option<Self> {
        serde_json::from_str(content).ok()
    }

    fn apply_env_key(&mut self, key: Option<String>) {
        if let Some(key) = key {
            let key = key.trim();
            if !key.is_empty() {
                self.api_key = key.to_string();
            }
        }
    }

    pub fn has_api_key(&self) -> bool {
        !self.api_key.trim().is_empty()
    }

    pub fn save(&self) {
        let path = Self::config_path();
        if let Ok(content) = serde_json::to_string_pretty(self) {
            if let Err(e) = fs::write(&path, content) {
                tracing::warn!("failed to save config to {}: {}", path.display(), e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = AppConfig::from_json(r#"{"api_key": "abc"}"#).unwrap();
        assert_eq!(config.api_key, "abc");
        assert_eq!(config.min_vote_count, 220);
        assert_eq!(config.api_base, "https://api.themoviedb.org/3");
        assert!(config.dark_mode);
    }

    #[test]
    fn test_invalid_json_is_rejected() {
        assert!(AppConfig::from_json("not json").is_none());
    }

    #[test]
    fn test_env_key_overrides_saved_key() {
        let mut config = AppConfig {
            api_key: "saved".to_string(),
            ..Default::default()
        };
        config.apply_env_key(Some("  from-env ".to_string()));
        assert_eq!(config.api_key, "from-env");
    }

    #[test]
    fn test_blank_env_key_is_ignored() {
        let mut config = AppConfig {
            api_key: "saved".to_string(),
            ..Default::default()
        };
        config.apply_env_key(Some("   ".to_string()));
        assert_eq!(config.api_key, "saved");
        config.apply_env_key(None);
        assert_eq!(config.api_key, "saved");
        assert!(config.has_api_key());
    }
}

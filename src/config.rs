use crate::api::constants::DEFAULT_BASE_PATH;
use anyhow::{Context, Result};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

pub const URL_ENV: &str = "SURVEY_ADMIN_URL";
pub const BASE_PATH_ENV: &str = "SURVEY_ADMIN_BASE_PATH";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_base_path")]
    pub base_path: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_base_path() -> String {
    DEFAULT_BASE_PATH.to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            base_path: default_base_path(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_suggestion_debounce_ms")]
    pub suggestion_debounce_ms: u64,
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

fn default_suggestion_debounce_ms() -> u64 {
    250
}

fn default_page_size() -> usize {
    20
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            suggestion_debounce_ms: default_suggestion_debounce_ms(),
            page_size: default_page_size(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub settings: Settings,
    /// Survey title fragments that get the legacy template when no
    /// questions exist yet
    #[serde(default)]
    pub legacy_templates: Vec<String>,
}

impl Config {
    pub fn get_config_dir() -> Result<PathBuf> {
        let config_dir = if cfg!(target_os = "linux") {
            // Use XDG config directory on Linux
            dirs::config_dir()
                .context("Failed to get XDG config directory")?
                .join("survey-admin")
        } else {
            // Use home directory with dot prefix on Windows/Mac
            dirs::home_dir()
                .context("Failed to get home directory")?
                .join(".survey-admin")
        };

        if !config_dir.exists() {
            fs::create_dir_all(&config_dir)
                .with_context(|| format!("Failed to create config directory: {:?}", config_dir))?;
            info!("Created config directory: {:?}", config_dir);
        }

        Ok(config_dir)
    }

    pub fn get_config_path() -> Result<PathBuf> {
        Ok(Self::get_config_dir()?.join("config.toml"))
    }

    /// Path of the local SQLite store, next to the config file
    pub fn store_path() -> Result<PathBuf> {
        Ok(Self::get_config_dir()?.join("store.db"))
    }

    /// Load the config file, then apply environment overrides
    pub fn load() -> Result<Self> {
        let mut config = Self::load_file()?;
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    fn load_file() -> Result<Self> {
        let config_path = Self::get_config_path()?;
        debug!("Loading config from: {:?}", config_path);

        if !config_path.exists() {
            info!("Config file doesn't exist, using defaults");
            return Ok(Self::default());
        }

        let config_content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {:?}", config_path))?;

        Self::parse(&config_content)
            .with_context(|| format!("Failed to parse config file: {:?}", config_path))
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        debug!(
            "Parsed config for {} with {} legacy templates",
            config.api.base_url,
            config.legacy_templates.len()
        );
        Ok(config)
    }

    /// Override API location from environment-style lookups
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup(URL_ENV).filter(|v| !v.trim().is_empty()) {
            debug!("Using {} from environment: {}", URL_ENV, url);
            self.api.base_url = url;
        }
        if let Some(path) = lookup(BASE_PATH_ENV) {
            debug!("Using {} from environment: {}", BASE_PATH_ENV, path);
            self.api.base_path = path;
        }
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::get_config_path()?;
        debug!("Saving config to: {:?}", config_path);

        let config_content =
            toml::to_string_pretty(self).context("Failed to serialize config to TOML")?;

        fs::write(&config_path, config_content)
            .with_context(|| format!("Failed to write config file: {:?}", config_path))?;

        info!("Config saved successfully");
        Ok(())
    }

    /// Whether a survey title selects the legacy template
    pub fn matches_legacy_title(&self, title: &str) -> bool {
        crate::builder::template::matches_legacy_title(title, &self.legacy_templates)
    }

    pub fn add_legacy_template(&mut self, fragment: String) -> Result<()> {
        let fragment = fragment.trim().to_string();
        if fragment.is_empty() {
            anyhow::bail!("Legacy template title cannot be empty");
        }
        if self
            .legacy_templates
            .iter()
            .any(|existing| existing.eq_ignore_ascii_case(&fragment))
        {
            anyhow::bail!("Legacy template title '{}' already configured", fragment);
        }
        info!("Adding legacy template title: {}", fragment);
        self.legacy_templates.push(fragment);
        self.save()
    }

    pub fn remove_legacy_template(&mut self, fragment: &str) -> Result<()> {
        let before = self.legacy_templates.len();
        self.legacy_templates
            .retain(|existing| !existing.eq_ignore_ascii_case(fragment.trim()));
        if self.legacy_templates.len() == before {
            anyhow::bail!("Legacy template title '{}' not found", fragment);
        }
        info!("Removed legacy template title: {}", fragment);
        self.save()
    }

    /// Read a setting by its dotted key
    pub fn get_setting(&self, key: &str) -> Result<String> {
        let value = match key {
            "api.base_url" => self.api.base_url.clone(),
            "api.base_path" => self.api.base_path.clone(),
            "api.timeout_secs" => self.api.timeout_secs.to_string(),
            "settings.suggestion_debounce_ms" => self.settings.suggestion_debounce_ms.to_string(),
            "settings.page_size" => self.settings.page_size.to_string(),
            other => anyhow::bail!("Unknown setting '{}'", other),
        };
        Ok(value)
    }

    /// Update a setting by its dotted key without saving
    pub fn set_setting(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "api.base_url" => self.api.base_url = value.trim().to_string(),
            "api.base_path" => self.api.base_path = value.trim().to_string(),
            "api.timeout_secs" => {
                self.api.timeout_secs = value
                    .trim()
                    .parse()
                    .with_context(|| format!("Invalid timeout: '{}'", value))?
            }
            "settings.suggestion_debounce_ms" => {
                self.settings.suggestion_debounce_ms = value
                    .trim()
                    .parse()
                    .with_context(|| format!("Invalid debounce: '{}'", value))?
            }
            "settings.page_size" => {
                let size: usize = value
                    .trim()
                    .parse()
                    .with_context(|| format!("Invalid page size: '{}'", value))?;
                if size == 0 {
                    anyhow::bail!("Page size must be at least 1");
                }
                self.settings.page_size = size;
            }
            other => anyhow::bail!("Unknown setting '{}'", other),
        }
        info!("Updated setting {}", key);
        Ok(())
    }

    pub const SETTING_KEYS: [&'static str; 5] = [
        "api.base_url",
        "api.base_path",
        "api.timeout_secs",
        "settings.suggestion_debounce_ms",
        "settings.page_size",
    ];
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_fill_missing_sections() {
        let config = Config::parse("legacy_templates = [\"Engagement\"]").unwrap();
        assert_eq!(config.api.base_path, "/api/v1");
        assert_eq!(config.api.timeout_secs, 30);
        assert_eq!(config.settings.suggestion_debounce_ms, 250);
        assert_eq!(config.settings.page_size, 20);
        assert_eq!(config.legacy_templates, vec!["Engagement"]);
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::parse("[api]\nbase_url = \"https://file.example.com\"").unwrap();
        config.apply_overrides(|key| match key {
            URL_ENV => Some("https://env.example.com".to_string()),
            _ => None,
        });
        assert_eq!(config.api.base_url, "https://env.example.com");
        assert_eq!(config.api.base_path, "/api/v1");
    }

    #[test]
    fn test_settings_by_key() {
        let mut config = Config::default();
        config.set_setting("settings.page_size", "50").unwrap();
        assert_eq!(config.get_setting("settings.page_size").unwrap(), "50");
        assert!(config.set_setting("settings.page_size", "0").is_err());
        assert!(config.set_setting("api.timeout_secs", "soon").is_err());
        assert!(config.get_setting("nope").is_err());
        for key in Config::SETTING_KEYS {
            assert!(config.get_setting(key).is_ok());
        }
    }

    #[test]
    fn test_roundtrip_through_toml() {
        let mut config = Config::default();
        config.legacy_templates.push("Pulse".to_string());
        let text = toml::to_string_pretty(&config).unwrap();
        assert_eq!(Config::parse(&text).unwrap(), config);
    }
}

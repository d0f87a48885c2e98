// TOML config adapter - Configuration management using TOML files

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::errors::*;
use crate::domain::model::Resolution;
use crate::utils::logging::LogLevel;

/// Complete runtime configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub render: RenderConfig,
    pub playback: PlaybackConfig,
    pub generation: GenerationConfig,
    pub logging: LoggingSection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub base_url: String,
    pub poll_interval_secs: u64,
    pub max_poll_attempts: u32,
    pub resolution: String,
    pub fps: u32,
    pub request_timeout_secs: u64,
    pub include_segment_audio: bool,
    pub segment_audio_volume: f64,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080/api".to_string(),
            poll_interval_secs: 5,
            max_poll_attempts: 120,
            resolution: "1080p".to_string(),
            fps: 24,
            request_timeout_secs: 30,
            include_segment_audio: false,
            segment_audio_volume: 1.0,
        }
    }
}

impl RenderConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    pub tick_ms: u64,
    pub drift_threshold_secs: f64,
    pub dialogue_stagger_secs: f64,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            tick_ms: 100,
            drift_threshold_secs: 0.5,
            dialogue_stagger_secs: 3.0,
        }
    }
}

impl PlaybackConfig {
    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    pub base_url: String,
    pub inter_item_delay_secs: u64,
    pub rate_limit_backoff_secs: u64,
    pub max_rate_limit_retries: u32,
    pub request_timeout_secs: u64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080/api".to_string(),
            inter_item_delay_secs: 6,
            rate_limit_backoff_secs: 60,
            max_rate_limit_retries: 5,
            request_timeout_secs: 300,
        }
    }
}

impl GenerationConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    pub level: String,
    pub json: bool,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl AppConfig {
    /// Validate value ranges that serde cannot express
    pub fn validate(&self) -> Result<(), DomainError> {
        LogLevel::parse(&self.logging.level)?;
        Resolution::parse(&self.render.resolution)?;

        if self.render.poll_interval_secs == 0 {
            return Err(DomainError::ConfigError(
                "render.poll_interval_secs must be greater than zero".to_string(),
            ));
        }
        if self.render.max_poll_attempts == 0 {
            return Err(DomainError::ConfigError(
                "render.max_poll_attempts must be greater than zero".to_string(),
            ));
        }
        if self.render.fps == 0 {
            return Err(DomainError::ConfigError("render.fps must be greater than zero".to_string()));
        }
        if self.playback.tick_ms == 0 {
            return Err(DomainError::ConfigError(
                "playback.tick_ms must be greater than zero".to_string(),
            ));
        }
        if !(self.playback.drift_threshold_secs > 0.0) {
            return Err(DomainError::ConfigError(
                "playback.drift_threshold_secs must be positive".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.render.segment_audio_volume) {
            return Err(DomainError::ConfigError(
                "render.segment_audio_volume must be within [0, 1]".to_string(),
            ));
        }

        Ok(())
    }
}

/// TOML configuration adapter
pub struct TomlConfigAdapter {
    config: AppConfig,
    config_file_path: Option<PathBuf>,
}

impl TomlConfigAdapter {
    /// Create adapter holding defaults
    pub fn new() -> Self {
        Self {
            config: AppConfig::default(),
            config_file_path: None,
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut AppConfig {
        &mut self.config
    }

    pub fn into_config(self) -> AppConfig {
        self.config
    }

    pub fn config_file_path(&self) -> Option<&Path> {
        self.config_file_path.as_deref()
    }

    /// Default config file location (`$HOME/.config/scenesync/config.toml`)
    pub fn default_config_path() -> PathBuf {
        if let Some(config_home) = std::env::var_os("XDG_CONFIG_HOME") {
            PathBuf::from(config_home).join("scenesync").join("config.toml")
        } else if let Some(home) = std::env::var_os("HOME") {
            PathBuf::from(home).join(".config").join("scenesync").join("config.toml")
        } else {
            PathBuf::from("scenesync.toml")
        }
    }

    /// Parse a TOML document on top of the defaults
    pub fn deserialize_config(content: &str) -> Result<AppConfig, DomainError> {
        toml::from_str(content)
            .map_err(|e| DomainError::ConfigError(format!("Failed to parse TOML config: {}", e)))
    }

    pub fn serialize_config(&self) -> Result<String, DomainError> {
        toml::to_string_pretty(&self.config)
            .map_err(|e| DomainError::ConfigError(format!("Failed to serialize config: {}", e)))
    }

    /// Load configuration from file, replacing the current values
    pub fn load_config(&mut self, file_path: &Path) -> Result<(), DomainError> {
        if !file_path.exists() {
            return Err(DomainError::ConfigError(format!(
                "Config file does not exist: {}",
                file_path.display()
            )));
        }

        let content = std::fs::read_to_string(file_path)
            .map_err(|e| DomainError::ConfigError(format!("Failed to read config file: {}", e)))?;

        self.config = Self::deserialize_config(&content)?;
        self.config_file_path = Some(file_path.to_path_buf());
        tracing::debug!(path = %file_path.display(), "Configuration file loaded");
        Ok(())
    }

    /// Save configuration to file
    pub fn save_config(&mut self, file_path: &Path) -> Result<(), DomainError> {
        if let Some(parent) = file_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                DomainError::ConfigError(format!("Failed to create config directory: {}", e))
            })?;
        }

        let content = self.serialize_config()?;
        std::fs::write(file_path, content)
            .map_err(|e| DomainError::ConfigError(format!("Failed to write config file: {}", e)))?;

        self.config_file_path = Some(file_path.to_path_buf());
        Ok(())
    }

    /// Apply a single `SCENESYNC_*` style override by key; returns whether the key is known
    pub fn set_config(&mut self, key: &str, value: &str) -> Result<bool, DomainError> {
        let config = &mut self.config;
        match key {
            "render_base_url" => config.render.base_url = value.to_string(),
            "render_poll_interval_secs" => config.render.poll_interval_secs = parse_value(key, value)?,
            "render_max_poll_attempts" => config.render.max_poll_attempts = parse_value(key, value)?,
            "render_resolution" => config.render.resolution = value.to_string(),
            "render_fps" => config.render.fps = parse_value(key, value)?,
            "playback_tick_ms" => config.playback.tick_ms = parse_value(key, value)?,
            "playback_drift_threshold_secs" => {
                config.playback.drift_threshold_secs = parse_value(key, value)?
            }
            "generation_base_url" => config.generation.base_url = value.to_string(),
            "generation_inter_item_delay_secs" => {
                config.generation.inter_item_delay_secs = parse_value(key, value)?
            }
            "generation_rate_limit_backoff_secs" => {
                config.generation.rate_limit_backoff_secs = parse_value(key, value)?
            }
            "log_level" => config.logging.level = value.to_string(),
            "log_json" => config.logging.json = parse_value(key, value)?,
            _ => return Ok(false),
        }
        tracing::debug!("Set config {} = {}", key, value);
        Ok(true)
    }
}

impl Default for TomlConfigAdapter {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_value<T>(key: &str, value: &str) -> Result<T, DomainError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse::<T>()
        .map_err(|e| DomainError::ConfigError(format!("Invalid value for {}: {}", key, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.render.poll_interval_secs, 5);
        assert_eq!(config.render.max_poll_attempts, 120);
        assert_eq!(config.playback.tick_ms, 100);
        assert_eq!(config.generation.inter_item_delay_secs, 6);
    }

    #[test]
    fn test_partial_document_keeps_defaults() {
        let config = TomlConfigAdapter::deserialize_config(
            "[render]\nbase_url = \"https://render.example\"\n\n[logging]\nlevel = \"debug\"\n",
        )
        .unwrap();
        assert_eq!(config.render.base_url, "https://render.example");
        assert_eq!(config.render.max_poll_attempts, 120);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = AppConfig::default();
        config.render.max_poll_attempts = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.logging.level = "loud".to_string();
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.render.resolution = "8k".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut adapter = TomlConfigAdapter::new();
        adapter.config_mut().render.fps = 30;
        adapter.save_config(&path).unwrap();

        let mut loaded = TomlConfigAdapter::new();
        loaded.load_config(&path).unwrap();
        assert_eq!(loaded.config().render.fps, 30);
        assert_eq!(loaded.config_file_path(), Some(path.as_path()));
    }

    #[test]
    fn test_set_config_by_key() {
        let mut adapter = TomlConfigAdapter::new();
        assert!(adapter.set_config("render_poll_interval_secs", "2").unwrap());
        assert_eq!(adapter.config().render.poll_interval_secs, 2);
        assert!(!adapter.set_config("unknown_key", "1").unwrap());
        assert!(adapter.set_config("render_fps", "fast").is_err());
    }
}

//! Error handling module for SceneSync

use thiserror::Error;

use crate::domain::errors::DomainError;

/// Main error type for SceneSync operations
#[derive(Error, Debug)]
pub enum SceneSyncError {
    /// Project file missing or unreadable
    #[error("Project file not found: {path}")]
    ProjectNotFound { path: String },

    /// Project file has an extension we cannot parse
    #[error("Unsupported project format: {path}. Expected .json, .yaml or .yml")]
    UnsupportedFormat { path: String },

    /// Project content failed validation
    #[error("Invalid project: {message}")]
    InvalidProject { message: String },

    /// Configuration error
    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    /// Wrapped domain error
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// YAML error
    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// TOML parse error
    #[error("TOML error: {0}")]
    TomlError(#[from] toml::de::Error),

    /// HTTP client error
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),
}

/// Result type alias for SceneSync operations
pub type SceneSyncResult<T> = std::result::Result<T, SceneSyncError>;

//! Logging configuration and progress output

use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

use crate::domain::errors::DomainError;

/// Logging configuration options
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Global log level, overridden by `RUST_LOG` when set
    pub level: LogLevel,
    /// Output format
    pub format: LogFormat,
    /// Include target module information
    pub target: bool,
    /// Progress reporting configuration
    pub progress: ProgressConfig,
}

/// Log level configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Parse log level from string
    pub fn parse(level_str: &str) -> Result<Self, DomainError> {
        match level_str.to_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            _ => Err(DomainError::BadArgs(format!(
                "Invalid log level: {}. Valid levels: trace, debug, info, warn, error",
                level_str
            ))),
        }
    }

    pub fn as_filter(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogFormat {
    /// Human-readable text format
    Pretty,
    /// Compact text format
    Compact,
    /// JSON format for structured logging
    Json,
}

/// Progress reporting configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressConfig {
    /// Enable progress lines
    pub enabled: bool,
    /// Width of the text progress bar
    pub bar_width: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            format: LogFormat::Compact,
            target: false,
            progress: ProgressConfig {
                enabled: true,
                bar_width: 20,
            },
        }
    }
}

impl LoggingConfig {
    /// Build from a level name and the JSON switch of the `[logging]` section
    pub fn from_settings(level: &str, json: bool) -> Result<Self, DomainError> {
        Ok(Self {
            level: LogLevel::parse(level)?,
            format: if json { LogFormat::Json } else { LogFormat::Compact },
            ..Self::default()
        })
    }
}

/// Logging system manager
pub struct LoggingSystem {
    config: LoggingConfig,
}

impl Default for LoggingSystem {
    fn default() -> Self {
        Self::new(LoggingConfig::default())
    }
}

impl LoggingSystem {
    /// Create a new logging system with configuration
    pub fn new(config: LoggingConfig) -> Self {
        Self { config }
    }

    /// Install the global subscriber. A second call is a no-op.
    pub fn initialize(&self) {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(self.config.level.as_filter()));

        let builder = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(self.config.target)
            .with_writer(std::io::stderr);

        let result = match self.config.format {
            LogFormat::Json => builder.json().try_init(),
            LogFormat::Pretty => builder.pretty().try_init(),
            LogFormat::Compact => builder.compact().try_init(),
        };

        if result.is_ok() {
            tracing::debug!(level = ?self.config.level, format = ?self.config.format, "Logging initialized");
        }
    }

    /// Create progress reporter
    pub fn create_progress_reporter(&self) -> ProgressReporter {
        ProgressReporter::new(self.config.progress.clone())
    }

    /// Log build information
    pub fn log_system_info(&self) {
        tracing::info!("=== SceneSync ===");
        tracing::info!("Version: {}", env!("CARGO_PKG_VERSION"));
        tracing::debug!("Logging level: {:?}", self.config.level);
        tracing::debug!("Output format: {:?}", self.config.format);
    }
}

/// Progress reporter for long-running operations
pub struct ProgressReporter {
    config: ProgressConfig,
    current_operation: Option<String>,
    start_time: Option<std::time::Instant>,
}

impl ProgressReporter {
    /// Create a new progress reporter
    pub fn new(config: ProgressConfig) -> Self {
        Self {
            config,
            current_operation: None,
            start_time: None,
        }
    }

    /// Start a new operation
    pub fn start_operation(&mut self, operation: impl Into<String>) {
        let operation = operation.into();
        if self.config.enabled {
            tracing::info!("Starting: {}", operation);
        }
        self.current_operation = Some(operation);
        self.start_time = Some(std::time::Instant::now());
    }

    /// Render a progress line for a percentage in [0, 100]
    pub fn format_progress(&self, percent: f64, description: &str) -> String {
        let percent = percent.clamp(0.0, 100.0);
        let width = self.config.bar_width;
        let filled = ((percent / 100.0) * width as f64).round() as usize;
        format!(
            "[{}{}] {:>3.0}% {}",
            "#".repeat(filled.min(width)),
            "-".repeat(width - filled.min(width)),
            percent,
            description
        )
    }

    /// Update progress
    pub fn update_progress(&self, percent: f64, description: &str) {
        if self.config.enabled {
            tracing::info!("{}", self.format_progress(percent, description));
        }
    }

    /// Complete the current operation
    pub fn complete_operation(&mut self, success: bool) {
        if let Some(operation) = &self.current_operation {
            let status = if success { "completed" } else { "failed" };
            match self.start_time {
                Some(start_time) => tracing::info!(
                    "{} {} in {:.2}s",
                    operation,
                    status,
                    start_time.elapsed().as_secs_f64()
                ),
                None => tracing::info!("{} {}", operation, status),
            }
        }

        self.current_operation = None;
        self.start_time = None;
    }
}

// Domain errors - Error types for the domain layer

use std::fmt;

/// Domain-specific error types
#[derive(Debug, Clone, PartialEq)]
pub enum DomainError {
    /// Invalid arguments provided
    BadArgs(String),
    /// Invalid time range
    InvalidTimeRange(String),
    /// Referenced segment, take or queue item does not exist
    NotFound(String),
    /// Render request cannot be built from the current session
    InvalidPayload(String),
    /// A render job is already preparing or rendering
    RenderInProgress,
    /// The render service reported a failed job
    RenderFailed(String),
    /// Poll attempts exhausted before the job finished
    RenderTimeout { attempts: u32 },
    /// External generation API asked us to slow down
    RateLimited { retry_after_secs: Option<u64> },
    /// External service unreachable or answered with an unexpected status
    ServiceUnavailable(String),
    /// Media element failed to load or play
    MediaError(String),
    /// Configuration value invalid
    ConfigError(String),
    /// Internal error
    InternalError(String),
}

impl DomainError {
    /// Transient errors are retried locally and never surfaced as a session failure
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            DomainError::ServiceUnavailable(_) | DomainError::MediaError(_)
        )
    }
}

impl fmt::Display for DomainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DomainError::BadArgs(msg) => write!(f, "Bad arguments: {}", msg),
            DomainError::InvalidTimeRange(msg) => write!(f, "Invalid time range: {}", msg),
            DomainError::NotFound(msg) => write!(f, "Not found: {}", msg),
            DomainError::InvalidPayload(msg) => write!(f, "Invalid render payload: {}", msg),
            DomainError::RenderInProgress => {
                write!(f, "A render job is already in progress")
            }
            DomainError::RenderFailed(msg) => write!(f, "Render failed: {}", msg),
            DomainError::RenderTimeout { attempts } => {
                write!(f, "Render job timed out after {} poll attempts", attempts)
            }
            DomainError::RateLimited { retry_after_secs } => match retry_after_secs {
                Some(secs) => write!(f, "Rate limited, retry after {}s", secs),
                None => write!(f, "Rate limited"),
            },
            DomainError::ServiceUnavailable(msg) => write!(f, "Service unavailable: {}", msg),
            DomainError::MediaError(msg) => write!(f, "Media error: {}", msg),
            DomainError::ConfigError(msg) => write!(f, "Configuration error: {}", msg),
            DomainError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for DomainError {}

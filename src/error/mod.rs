//! Error types for docext.

use thiserror::Error;

/// Primary error type for all docext operations.
#[derive(Error, Debug)]
pub enum DocextError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Malformed response envelope: {0}")]
    MalformedEnvelope(String),

    #[error("Result store error at {location}: {message}")]
    Storage { location: String, message: String },

    #[error("Invalid result location: {0}")]
    InvalidLocation(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Timed out after {waited_ms}ms ({attempts} polls) waiting for {location}")]
    Timeout {
        waited_ms: u64,
        attempts: u32,
        location: String,
    },
}

/// Coarse classification used by callers to pick a recovery path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Transport, auth, HTTP status, storage or envelope failure. Not retried here.
    Service,
    /// The asynchronous result never appeared within the polling budget.
    Timeout,
    Configuration,
    InvalidInput,
}

impl DocextError {
    /// Create an API error from a status code and body.
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    pub fn storage(location: impl ToString, message: impl Into<String>) -> Self {
        Self::Storage {
            location: location.to_string(),
            message: message.into(),
        }
    }

    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Timeout { .. } => ErrorKind::Timeout,
            Self::Configuration(_) => ErrorKind::Configuration,
            Self::InvalidArgument(_) | Self::InvalidLocation(_) => ErrorKind::InvalidInput,
            Self::Api { .. }
            | Self::Network(_)
            | Self::Io(_)
            | Self::Serialization(_)
            | Self::Authentication(_)
            | Self::MalformedEnvelope(_)
            | Self::Storage { .. } => ErrorKind::Service,
        }
    }

    /// Whether resubmitting the same request may succeed.
    ///
    /// Only a polling timeout qualifies; service failures are surfaced as-is
    /// and retry policy belongs to the caller.
    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::Timeout
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, DocextError>;

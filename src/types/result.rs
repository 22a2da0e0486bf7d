//! Generation outcomes and asynchronous result handles.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::DocextError;

/// Outcome of exactly one generation request.
#[derive(Debug, Clone, PartialEq)]
pub enum GenerationResult {
    /// Raw model output.
    Text(String),
    Failure(FailureReason),
}

/// Why a request produced no text without a service error.
#[derive(Debug, Clone, PartialEq)]
pub enum FailureReason {
    /// The asynchronous result did not appear within the polling budget.
    Timeout {
        waited: Duration,
        attempts: u32,
        location: ResultLocation,
    },
}

impl GenerationResult {
    pub fn is_text(&self) -> bool {
        matches!(self, Self::Text(_))
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Failure(_) => None,
        }
    }

    /// Convert into the generated text, surfacing failures as typed errors.
    pub fn into_text(self) -> Result<String, DocextError> {
        match self {
            Self::Text(text) => Ok(text),
            Self::Failure(FailureReason::Timeout {
                waited,
                attempts,
                location,
            }) => Err(DocextError::Timeout {
                waited_ms: waited.as_millis() as u64,
                attempts,
                location: location.to_string(),
            }),
        }
    }
}

/// Reference to a result blob: `scheme://container/key`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ResultLocation {
    pub scheme: String,
    pub container: String,
    pub key: String,
}

impl ResultLocation {
    pub fn new(
        scheme: impl Into<String>,
        container: impl Into<String>,
        key: impl Into<String>,
    ) -> Self {
        Self {
            scheme: scheme.into(),
            container: container.into(),
            key: key.into(),
        }
    }
}

impl FromStr for ResultLocation {
    type Err = DocextError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || DocextError::InvalidLocation(s.to_string());
        let (scheme, rest) = s.trim().split_once("://").ok_or_else(invalid)?;
        let (container, key) = rest.split_once('/').ok_or_else(invalid)?;
        if scheme.is_empty() || container.is_empty() || key.is_empty() {
            return Err(invalid());
        }
        Ok(Self::new(scheme, container, key))
    }
}

impl TryFrom<String> for ResultLocation {
    type Error = DocextError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ResultLocation> for String {
    fn from(location: ResultLocation) -> Self {
        location.to_string()
    }
}

impl fmt::Display for ResultLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}/{}", self.scheme, self.container, self.key)
    }
}

/// Acknowledgment of an asynchronous submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AsyncHandle {
    pub location: ResultLocation,
    pub inference_id: Option<String>,
}

impl AsyncHandle {
    pub fn new(location: ResultLocation) -> Self {
        Self {
            location,
            inference_id: None,
        }
    }
}

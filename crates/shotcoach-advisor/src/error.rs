//! Advisor error types.

use std::fmt;
use thiserror::Error;

/// Result type for advisor operations.
pub type AdvisorResult<T> = Result<T, AdvisorError>;

/// Errors that can occur while consulting the advisory model.
#[derive(Debug, Error)]
pub enum AdvisorError {
    #[error("Advisor not configured: {0}")]
    NotConfigured(String),

    #[error("Advisor request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Advisor returned HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Advisor refused: {0}")]
    Refused(String),

    #[error("Malformed advisor response: {0}")]
    Malformed(String),
}

/// Coarse failure classes used by the retry policy and metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    Timeout,
    Network,
    Http,
    Refused,
    Malformed,
}

impl FailureKind {
    /// Only transport-level failures are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(self, FailureKind::Timeout | FailureKind::Network)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::Timeout => "timeout",
            FailureKind::Network => "network",
            FailureKind::Http => "http",
            FailureKind::Refused => "refused",
            FailureKind::Malformed => "malformed",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl AdvisorError {
    pub fn not_configured(msg: impl Into<String>) -> Self {
        Self::NotConfigured(msg.into())
    }

    pub fn timeout(msg: impl Into<String>) -> Self {
        Self::Timeout(msg.into())
    }

    pub fn network(msg: impl Into<String>) -> Self {
        Self::Network(msg.into())
    }

    pub fn refused(msg: impl Into<String>) -> Self {
        Self::Refused(msg.into())
    }

    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::Malformed(msg.into())
    }

    pub fn kind(&self) -> FailureKind {
        match self {
            AdvisorError::Timeout(_) => FailureKind::Timeout,
            AdvisorError::Network(_) => FailureKind::Network,
            AdvisorError::Http { .. } => FailureKind::Http,
            AdvisorError::Refused(_) => FailureKind::Refused,
            AdvisorError::Malformed(_) => FailureKind::Malformed,
            // Local misconfiguration, never retried.
            AdvisorError::NotConfigured(_) => FailureKind::Http,
        }
    }
}

impl From<reqwest::Error> for AdvisorError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            AdvisorError::Timeout(e.to_string())
        } else if e.is_decode() {
            AdvisorError::Malformed(e.to_string())
        } else if let Some(status) = e.status() {
            AdvisorError::Http {
                status: status.as_u16(),
                body: e.to_string(),
            }
        } else {
            AdvisorError::Network(e.to_string())
        }
    }
}

impl From<serde_json::Error> for AdvisorError {
    fn from(e: serde_json::Error) -> Self {
        AdvisorError::Malformed(e.to_string())
    }
}

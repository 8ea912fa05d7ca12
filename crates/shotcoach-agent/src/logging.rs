//! Structured request logging utilities.
//!
//! Provides consistent, structured logging for guidance requests with
//! tracing spans and contextual information.

use tracing::{error, info, warn, Span};
use uuid::Uuid;

/// Request logger for structured logging with consistent formatting.
///
/// Every guidance call gets its own request id so the detector, advisor and
/// cache lines for one frame can be correlated.
#[derive(Debug, Clone)]
pub struct GuidanceLogger {
    request_id: String,
    operation: String,
}

impl GuidanceLogger {
    /// Create a logger with a fresh request id.
    pub fn new(operation: &str) -> Self {
        Self {
            request_id: Uuid::new_v4().to_string(),
            operation: operation.to_string(),
        }
    }

    pub fn log_start(&self, message: &str) {
        info!(
            request_id = %self.request_id,
            operation = %self.operation,
            "Request started: {}", message
        );
    }

    pub fn log_progress(&self, message: &str) {
        info!(
            request_id = %self.request_id,
            operation = %self.operation,
            "Request progress: {}", message
        );
    }

    pub fn log_warning(&self, message: &str) {
        warn!(
            request_id = %self.request_id,
            operation = %self.operation,
            "Request warning: {}", message
        );
    }

    pub fn log_error(&self, message: &str) {
        error!(
            request_id = %self.request_id,
            operation = %self.operation,
            "Request error: {}", message
        );
    }

    pub fn log_completion(&self, message: &str) {
        info!(
            request_id = %self.request_id,
            operation = %self.operation,
            "Request completed: {}", message
        );
    }

    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    pub fn operation(&self) -> &str {
        &self.operation
    }

    /// Span wrapping the whole request.
    pub fn create_span(&self) -> Span {
        tracing::info_span!(
            "guidance",
            request_id = %self.request_id,
            operation = %self.operation
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logger_gets_unique_ids() {
        let a = GuidanceLogger::new("get_guidance");
        let b = GuidanceLogger::new("get_guidance");
        assert_ne!(a.request_id(), b.request_id());
        assert_eq!(a.operation(), "get_guidance");
        assert!(Uuid::parse_str(a.request_id()).is_ok());
    }
}

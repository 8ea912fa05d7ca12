//! Agent error types.

use thiserror::Error;

use shotcoach_vision::VisionError;

pub type AgentResult<T> = Result<T, AgentError>;

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Vision error: {0}")]
    Vision(#[from] VisionError),
}

impl AgentError {
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// True when the caller supplied something unusable.
    pub fn is_input_error(&self) -> bool {
        match self {
            AgentError::InvalidInput(_) => true,
            AgentError::Vision(e) => e.is_input_error(),
        }
    }
}

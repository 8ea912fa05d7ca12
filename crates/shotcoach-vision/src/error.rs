//! Error types for frame analysis.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for vision operations.
pub type VisionResult<T> = Result<T, VisionError>;

/// Errors that can occur while decoding or analysing a frame.
#[derive(Debug, Error)]
pub enum VisionError {
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Image decode failed: {0}")]
    DecodeFailed(String),

    #[error("Image encode failed: {0}")]
    EncodeFailed(String),

    #[error("Image too small for analysis: {width}x{height}")]
    TooSmall { width: u32, height: u32 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl VisionError {
    pub fn decode_failed(message: impl Into<String>) -> Self {
        Self::DecodeFailed(message.into())
    }

    pub fn encode_failed(message: impl Into<String>) -> Self {
        Self::EncodeFailed(message.into())
    }

    /// True when the input itself is unusable (as opposed to a processing fault).
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            VisionError::FileNotFound(_) | VisionError::DecodeFailed(_) | VisionError::Io(_)
        )
    }
}

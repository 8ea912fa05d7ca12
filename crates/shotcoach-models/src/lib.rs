//! Shared data models for ShotCoach guidance.
//!
//! This crate provides Serde-serializable types for:
//! - Per-frame measurements (size, brightness, tilt)
//! - Canonical shooting suggestions (8-way direction, 1-5 intensity)
//! - Conversation history entries and summaries
//! - The guidance envelope handed to the transport layer

pub mod frame;
pub mod guidance;
pub mod session;
pub mod suggestion;

// Re-export common types
pub use frame::{AnalysisSummary, BrightnessTier, ImageMetrics, LevelSource, TiltDirection, TiltEstimate};
pub use guidance::GuidanceResponse;
pub use session::{HistoryMessage, HistorySummary, MessagePreview, Role};
pub use suggestion::{
    Direction, DirectionParseError, Intensity, IntensityError, Suggestion, MAX_SUGGESTIONS,
};

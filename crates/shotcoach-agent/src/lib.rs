//! ShotCoach guidance decision engine.
//!
//! This crate turns one camera frame into at most five ordered shooting
//! suggestions:
//! - Geometry and brightness readings from `shotcoach-vision`
//! - Arbitration between the geometry detector and the advisor's level check
//! - Validation of free-form advisor output, with text and fixed fallbacks
//! - A fingerprint-keyed result cache with optional disk persistence
//! - Conversation state (intent, bounded history) that conditions prompts

pub mod arbitration;
pub mod cache;
pub mod config;
pub mod error;
pub mod knowledge;
pub mod logging;
pub mod metrics;
pub mod orchestrator;
pub mod prompts;
pub mod session;
pub mod validator;

pub use arbitration::{assemble, correction_for, decide, parse_level_verdict, Decision, GuidanceSource};
pub use cache::{fingerprint, CacheEntry, ResultCache, SourceStamp};
pub use config::AgentConfig;
pub use error::{AgentError, AgentResult};
pub use knowledge::KnowledgeBase;
pub use logging::GuidanceLogger;
pub use orchestrator::{GuidanceAgent, ImageSource};
pub use session::SessionState;
pub use validator::{interpret, parse_advice, validate, AdviceParse, AdviceSource, ValidatedAdvice};

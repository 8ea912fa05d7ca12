//! Advisory collaborator for ShotCoach.
//!
//! The decision engine treats the multimodal model as an opaque, fallible
//! function from (prompt, frame) to text. This crate provides:
//! - The `Advisor` trait with the two call shapes (suggestions, level check)
//! - An OpenRouter / OpenAI-compatible chat-completions client
//! - The bounded retry policy (one retry, widened timeout)

pub mod client;
pub mod config;
pub mod error;
pub mod metrics;
pub mod openrouter;
pub mod retry;

pub use client::{AdviceCall, AdviceRequest, Advisor};
pub use config::{AdvisorConfig, CallPlan, CallSettings};
pub use error::{AdvisorError, AdvisorResult, FailureKind};
pub use openrouter::OpenRouterClient;
pub use retry::{advise_with_retry, with_deadline, RetryDecision, RetryPolicy};

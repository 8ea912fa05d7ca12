//! The advisory collaborator seam.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use shotcoach_models::HistoryMessage;

use crate::config::CallSettings;
use crate::error::AdvisorResult;

/// Which of the two call shapes a request belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AdviceCall {
    /// Free-form shooting suggestions.
    Advice,
    /// Keyword verdict on horizon levelness.
    LevelCheck,
}

impl AdviceCall {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdviceCall::Advice => "advice",
            AdviceCall::LevelCheck => "level_check",
        }
    }
}

impl fmt::Display for AdviceCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One multimodal request: optional system text, prior turns, the current
/// prompt and the frame.
#[derive(Debug, Clone)]
pub struct AdviceRequest {
    pub system: Option<String>,
    /// Earlier turns, oldest first. Only their text is sent.
    pub history: Vec<HistoryMessage>,
    pub prompt: String,
    /// Encoded frame (JPEG or PNG).
    pub image: Vec<u8>,
    pub max_tokens: u32,
    pub temperature: f32,
    pub timeout: Duration,
}

impl AdviceRequest {
    pub fn new(prompt: impl Into<String>, image: Vec<u8>, settings: CallSettings) -> Self {
        Self {
            system: None,
            history: Vec::new(),
            prompt: prompt.into(),
            image,
            max_tokens: settings.max_tokens,
            temperature: settings.temperature,
            timeout: settings.timeout,
        }
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    pub fn with_history(mut self, history: Vec<HistoryMessage>) -> Self {
        self.history = history;
        self
    }

    /// Same request with a longer deadline and a larger token budget.
    pub fn widened(mut self, timeout: Duration, max_tokens: u32) -> Self {
        self.timeout = self.timeout.max(timeout);
        self.max_tokens = self.max_tokens.max(max_tokens);
        self
    }
}

/// An opaque multimodal text generator.
///
/// Implementations must honour `request.timeout` and must not retry on their
/// own; retry is decided by [`crate::retry::RetryPolicy`].
#[async_trait]
pub trait Advisor: Send + Sync {
    /// Ask for shooting suggestions; returns the raw model text.
    async fn advise(&self, request: &AdviceRequest) -> AdvisorResult<String>;

    /// Ask only whether the horizon is level; returns a short verdict text.
    async fn advise_level_only(&self, request: &AdviceRequest) -> AdvisorResult<String>;

    /// Label used in logs.
    fn name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_widened_never_shrinks() {
        let request = AdviceRequest::new("p", vec![1, 2, 3], CallSettings::advice());
        let widened = request.clone().widened(Duration::from_secs(20), 600);
        assert_eq!(widened.timeout, Duration::from_secs(20));
        assert_eq!(widened.max_tokens, 600);

        let same = request.widened(Duration::from_secs(1), 100);
        assert_eq!(same.timeout, Duration::from_secs(10));
        assert_eq!(same.max_tokens, 350);
    }

    #[test]
    fn test_builder() {
        let request = AdviceRequest::new("p", Vec::new(), CallSettings::level_check())
            .with_system("sys")
            .with_history(vec![HistoryMessage::user("hi")]);
        assert_eq!(request.system.as_deref(), Some("sys"));
        assert_eq!(request.history.len(), 1);
        assert_eq!(request.max_tokens, 10);
    }
}

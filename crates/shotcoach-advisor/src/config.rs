//! Advisor configuration.

use std::time::Duration;

use crate::error::{AdvisorError, AdvisorResult};
use crate::retry::RetryPolicy;

/// Generation parameters for one call shape.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CallSettings {
    pub max_tokens: u32,
    pub temperature: f32,
    pub timeout: Duration,
}

impl CallSettings {
    /// Suggestion requests: room for five JSON records.
    pub fn advice() -> Self {
        Self {
            max_tokens: 350,
            temperature: 0.7,
            timeout: Duration::from_secs(10),
        }
    }

    /// Level checks: a single keyword answer.
    pub fn level_check() -> Self {
        Self {
            max_tokens: 10,
            temperature: 0.1,
            timeout: Duration::from_secs(10),
        }
    }
}

/// OpenRouter client configuration.
#[derive(Debug, Clone)]
pub struct AdvisorConfig {
    pub api_key: String,
    /// Chat-completions base URL (without the `/chat/completions` suffix).
    pub base_url: String,
    pub model: String,
    /// Sent as `HTTP-Referer`.
    pub site_url: Option<String>,
    /// Sent as `X-Title`.
    pub site_name: Option<String>,
    pub connect_timeout: Duration,
}

/// Per-call generation settings plus the retry policy for suggestion calls.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CallPlan {
    pub advice: CallSettings,
    pub level_check: CallSettings,
    pub retry: RetryPolicy,
}

impl Default for CallPlan {
    fn default() -> Self {
        Self {
            advice: CallSettings::advice(),
            level_check: CallSettings::level_check(),
            retry: RetryPolicy::default(),
        }
    }
}

impl CallPlan {
    /// Create plan from environment variables.
    pub fn from_env() -> Self {
        let advice_timeout_secs: u64 = std::env::var("SHOTCOACH_ADVICE_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(10);

        let retry_timeout_secs: u64 = std::env::var("SHOTCOACH_RETRY_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(20);

        let level_timeout_secs: u64 = std::env::var("SHOTCOACH_LEVEL_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(10);

        let mut plan = Self::default();
        plan.advice.timeout = Duration::from_secs(advice_timeout_secs);
        plan.level_check.timeout = Duration::from_secs(level_timeout_secs);
        plan.retry.widened_timeout = Duration::from_secs(retry_timeout_secs);
        plan
    }
}

impl AdvisorConfig {
    pub const DEFAULT_BASE_URL: &'static str = "https://openrouter.ai/api/v1";
    pub const DEFAULT_MODEL: &'static str = "minimax/minimax-01";

    /// Config with defaults for everything but the key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: Self::DEFAULT_BASE_URL.to_string(),
            model: Self::DEFAULT_MODEL.to_string(),
            site_url: None,
            site_name: None,
            connect_timeout: Duration::from_secs(5),
        }
    }

    /// Create config from environment variables.
    pub fn from_env() -> AdvisorResult<Self> {
        let api_key = std::env::var("OPENROUTER_API_KEY")
            .map_err(|_| AdvisorError::not_configured("OPENROUTER_API_KEY not set"))?;

        if api_key.trim().is_empty() {
            return Err(AdvisorError::not_configured("OPENROUTER_API_KEY cannot be empty"));
        }

        let mut config = Self::new(api_key.trim());

        if let Ok(base_url) = std::env::var("OPENROUTER_BASE_URL") {
            if !base_url.trim().is_empty() {
                config.base_url = base_url.trim().trim_end_matches('/').to_string();
            }
        }
        if let Ok(model) = std::env::var("SHOTCOACH_MODEL") {
            if !model.trim().is_empty() {
                config.model = model.trim().to_string();
            }
        }
        config.site_url = std::env::var("SITE_URL").ok().filter(|s| !s.is_empty());
        config.site_name = std::env::var("SITE_NAME").ok().filter(|s| !s.is_empty());

        Ok(config)
    }

    pub fn chat_completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

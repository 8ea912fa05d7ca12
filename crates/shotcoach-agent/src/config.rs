//! Agent configuration.

use std::path::PathBuf;
use std::time::Duration;

use shotcoach_advisor::CallPlan;
use shotcoach_vision::{DetectorConfig, UploadLimits};

/// Agent configuration.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// On-disk cache location; `None` keeps the cache in memory only.
    pub cache_file: Option<PathBuf>,
    /// Entries older than this are never served.
    pub cache_ttl: Duration,
    /// Maximum number of cached suggestion sets.
    pub cache_capacity: usize,
    /// Maximum number of retained conversation messages.
    pub history_limit: usize,
    /// Optional topic→tip JSON map injected into prompts.
    pub knowledge_file: Option<PathBuf>,
    pub detector: DetectorConfig,
    pub upload: UploadLimits,
    pub calls: CallPlan,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            cache_file: Some(PathBuf::from("ai_cache.json")),
            cache_ttl: Duration::from_secs(24 * 60 * 60),
            cache_capacity: 100,
            history_limit: 10,
            knowledge_file: Some(PathBuf::from("extracted_photography_knowledge.json")),
            detector: DetectorConfig::default(),
            upload: UploadLimits::default(),
            calls: CallPlan::default(),
        }
    }
}

impl AgentConfig {
    /// In-memory configuration without any files (tests, embedding).
    pub fn ephemeral() -> Self {
        Self {
            cache_file: None,
            knowledge_file: None,
            ..Default::default()
        }
    }

    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            cache_file: path_var("SHOTCOACH_CACHE_FILE", defaults.cache_file),
            cache_ttl: Duration::from_secs(
                std::env::var("SHOTCOACH_CACHE_TTL_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(86_400),
            ),
            cache_capacity: std::env::var("SHOTCOACH_CACHE_CAPACITY")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|&n: &usize| n > 0)
                .unwrap_or(100),
            history_limit: std::env::var("SHOTCOACH_HISTORY_LIMIT")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|&n: &usize| n > 0)
                .unwrap_or(10),
            knowledge_file: path_var("SHOTCOACH_KNOWLEDGE_FILE", defaults.knowledge_file),
            detector: DetectorConfig::from_env(),
            upload: defaults.upload,
            calls: CallPlan::from_env(),
        }
    }
}

/// Unset keeps the default; set-but-empty disables the file.
fn path_var(key: &str, default: Option<PathBuf>) -> Option<PathBuf> {
    match std::env::var(key) {
        Ok(value) if value.trim().is_empty() => None,
        Ok(value) => Some(PathBuf::from(value.trim())),
        Err(_) => default,
    }
}

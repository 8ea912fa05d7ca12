//! Conversation history entries.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Characters kept in a history preview before truncation.
pub const PREVIEW_CHARS: usize = 50;

/// Messages included in a history summary preview.
pub const PREVIEW_MESSAGES: usize = 5;

/// Speaker of a history message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One exchanged message. Frame bytes are never retained, only the fact that
/// the turn carried one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct HistoryMessage {
    pub role: Role,
    pub content: String,
    pub has_image: bool,
}

impl HistoryMessage {
    pub fn new(role: Role, content: impl Into<String>, has_image: bool) -> Self {
        Self {
            role,
            content: content.into(),
            has_image,
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content, false)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content, false)
    }

    /// Preview entry with the text cut at `PREVIEW_CHARS` characters.
    pub fn preview(&self) -> MessagePreview {
        let text_preview = if self.content.chars().count() > PREVIEW_CHARS {
            let head: String = self.content.chars().take(PREVIEW_CHARS).collect();
            format!("{}...", head)
        } else {
            self.content.clone()
        };

        MessagePreview {
            role: self.role,
            has_image: self.has_image,
            text_preview,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct MessagePreview {
    pub role: Role,
    pub has_image: bool,
    pub text_preview: String,
}

/// Compact view of the conversation for the transport layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct HistorySummary {
    pub total_messages: usize,
    /// Up to the last `PREVIEW_MESSAGES` messages, oldest first.
    pub messages_preview: Vec<MessagePreview>,
}

impl HistorySummary {
    pub fn from_history(history: &[HistoryMessage]) -> Self {
        let start = history.len().saturating_sub(PREVIEW_MESSAGES);
        Self {
            total_messages: history.len(),
            messages_preview: history[start..].iter().map(HistoryMessage::preview).collect(),
        }
    }
}

//! Conversation state: start/stop, shooting intent and rolling history.
//!
//! One `SessionState` lives per agent. It is not synchronized itself; the
//! agent keeps it behind a mutex and never holds that lock across an
//! advisor call.

use std::collections::VecDeque;

use shotcoach_models::{HistoryMessage, HistorySummary, Role};

use crate::error::{AgentError, AgentResult};

pub const GREETING: &str = "Hi! I'm your photo assistant 📸

Before we start, what would you like to shoot?

For example:
🌅 Landscapes (sunrise, mountains, the sea)
👤 Portraits (friends, family, selfies)
🍕 Food (restaurant dishes, home cooking)
🏗️ Architecture (historic or modern buildings)
🌸 Flowers and plants
🐱 Pets
📚 Products

Or anything else. Once I know what you're after I can give sharper composition and shooting tips.";

pub const ALREADY_STARTED: &str = "The session is already running; just tell me what you'd like to shoot!";

/// Conversation state for one agent.
#[derive(Debug, Clone)]
pub struct SessionState {
    started: bool,
    intent: Option<String>,
    history: VecDeque<HistoryMessage>,
    max_history: usize,
    /// Bumped on every clear.
    generation: u64,
}

impl SessionState {
    pub fn new(max_history: usize) -> Self {
        Self {
            started: false,
            intent: None,
            history: VecDeque::with_capacity(max_history + 1),
            max_history: max_history.max(1),
            generation: 0,
        }
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    pub fn intent(&self) -> Option<&str> {
        self.intent.as_deref()
    }

    pub fn max_history(&self) -> usize {
        self.max_history
    }

    /// Identifies the conversation; changes whenever it is cleared.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Begin a conversation. The first call resets all state and returns the
    /// greeting; later calls return a notice and change nothing.
    pub fn start(&mut self) -> String {
        if self.started {
            return ALREADY_STARTED.to_string();
        }

        self.clear();
        self.started = true;
        self.append(Role::Assistant, GREETING, false);
        GREETING.to_string()
    }

    /// Record the shooting intent and return the confirmation text.
    pub fn set_intent(&mut self, intent: &str) -> AgentResult<String> {
        let intent = intent.trim();
        if intent.is_empty() {
            return Err(AgentError::invalid_input("Intent cannot be empty"));
        }

        self.intent = Some(intent.to_string());
        self.append(Role::User, format!("I want to shoot: {}", intent), false);

        let confirmation = format!(
            "Great! You want to shoot **{}** 📸

Point the camera at the scene and I'll analyse each frame and suggest:
• Composition adjustments
• Better angles
• Where to move
• How to use the light

Go ahead, every tip will be tailored to {}.",
            intent, intent
        );
        self.append(Role::Assistant, confirmation.clone(), false);
        Ok(confirmation)
    }

    /// Reset started flag, intent and history together.
    pub fn clear(&mut self) {
        self.started = false;
        self.intent = None;
        self.history.clear();
        self.generation = self.generation.wrapping_add(1);
    }

    /// Push a message, dropping the oldest entries past the limit.
    pub fn append(&mut self, role: Role, content: impl Into<String>, has_image: bool) {
        self.history.push_back(HistoryMessage::new(role, content, has_image));
        while self.history.len() > self.max_history {
            self.history.pop_front();
        }
    }

    /// Snapshot of the history, oldest first.
    pub fn history(&self) -> Vec<HistoryMessage> {
        self.history.iter().cloned().collect()
    }

    pub fn summary(&self) -> HistorySummary {
        let history: Vec<HistoryMessage> = self.history();
        HistorySummary::from_history(&history)
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new(10)
    }
}

//! Message and History domain types.
//!
//! These are the core value objects of a session's conversation: each turn
//! appends a user-role prompt and an assistant-role response (with parsed
//! thought/action metadata) to the `History`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The role of a message sender in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The environment / task driver
    User,
    /// The model
    Assistant,
    /// Behavioral instructions (command docs, response format)
    System,
}

/// A single message in a session's conversation history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Who sent this message
    pub role: Role,

    /// The text content
    pub content: String,

    /// The parsed thought, if this is an assistant turn
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thought: Option<String>,

    /// The parsed command line, if this is an assistant turn
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,

    /// Timestamp
    pub timestamp: DateTime<Utc>,
}

impl Message {
    /// Create a new user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            thought: None,
            action: None,
            timestamp: Utc::now(),
        }
    }

    /// Create a new assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            thought: None,
            action: None,
            timestamp: Utc::now(),
        }
    }

    /// Create an assistant message carrying parsed thought/action metadata.
    pub fn assistant_turn(
        content: impl Into<String>,
        thought: impl Into<String>,
        action: impl Into<String>,
    ) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            thought: Some(thought.into()),
            action: Some(action.into()),
            timestamp: Utc::now(),
        }
    }

    /// Create a new system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
            thought: None,
            action: None,
            timestamp: Utc::now(),
        }
    }
}

/// An ordered, append-only conversation history.
///
/// The one sanctioned non-append mutation is [`History::truncate_tail`],
/// used by the stuck-loop recovery heuristic; it never removes a leading
/// system message.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct History {
    messages: Vec<Message>,
}

impl History {
    /// Create a new empty history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message.
    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Number of messages.
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Whether the history is empty.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// All messages, in order.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Whether the history starts with a system message.
    pub fn starts_with_system(&self) -> bool {
        self.messages.first().is_some_and(|m| m.role == Role::System)
    }

    /// Ensure a system message is the first entry, inserting or replacing it.
    pub fn set_system(&mut self, content: impl Into<String>) {
        let msg = Message::system(content);
        if self.starts_with_system() {
            self.messages[0] = msg;
        } else {
            self.messages.insert(0, msg);
        }
    }

    /// The content of the most recent `n` user-role messages, newest first.
    pub fn last_user_contents(&self, n: usize) -> Vec<&str> {
        self.messages
            .iter()
            .rev()
            .filter(|m| m.role == Role::User)
            .take(n)
            .map(|m| m.content.as_str())
            .collect()
    }

    /// Remove up to `n` messages from the tail.
    ///
    /// A leading system message is never removed, regardless of `n`.
    /// Returns the number of messages actually removed.
    pub fn truncate_tail(&mut self, n: usize) -> usize {
        let floor = if self.starts_with_system() { 1 } else { 0 };
        let removable = self.messages.len().saturating_sub(floor);
        let removed = n.min(removable);
        self.messages.truncate(self.messages.len() - removed);
        removed
    }

    /// Clear all messages.
    pub fn clear(&mut self) {
        self.messages.clear();
    }
}

//! Conversation transcript — append-only log of exchanged messages.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A selectable option presented to the user under a bot message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Choice {
    /// Stable value sent back to the engine when selected.
    pub value: String,
    /// Display label shown to the user.
    pub label: String,
    /// Selecting this option triggers the emergency path regardless of step.
    #[serde(default)]
    pub emergency: bool,
}

impl Choice {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
            emergency: false,
        }
    }

    pub fn emergency(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
            emergency: true,
        }
    }
}

/// Who authored a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Origin {
    Bot,
    User,
}

/// One entry in the transcript. Immutable once appended.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Strictly increasing within one transcript.
    pub id: u64,
    pub origin: Origin,
    pub text: String,
    /// Options attached to this message (empty for plain messages).
    pub choices: Vec<Choice>,
    /// High-salience emergency flag for rendering.
    pub emergency: bool,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    pub fn is_bot(&self) -> bool {
        self.origin == Origin::Bot
    }
}

/// Ordered, append-only sequence of messages.
///
/// Ids are assigned at append time and never reused; prior entries are
/// never mutated or removed, so the log doubles as an audit trail.
#[derive(Debug, Default)]
pub struct Transcript {
    messages: Vec<Message>,
    next_id: u64,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message, assigning its id and timestamp. Returns the id.
    pub fn append(
        &mut self,
        origin: Origin,
        text: impl Into<String>,
        choices: Vec<Choice>,
        emergency: bool,
    ) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.messages.push(Message {
            id,
            origin,
            text: text.into(),
            choices,
            emergency,
            timestamp: Utc::now(),
        });
        id
    }

    /// Append a plain bot message.
    pub fn append_bot(&mut self, text: impl Into<String>) -> u64 {
        self.append(Origin::Bot, text, Vec::new(), false)
    }

    /// Append a plain user message.
    pub fn append_user(&mut self, text: impl Into<String>) -> u64 {
        self.append(Origin::User, text, Vec::new(), false)
    }

    /// The option set still awaiting an answer, if any.
    ///
    /// A prompt stays open until the user replies. Plain bot messages
    /// appended after it (late failure warnings in particular) do not
    /// close it, so the scan walks back to the nearest user message.
    pub fn last_options_prompt(&self) -> Option<&[Choice]> {
        for message in self.messages.iter().rev() {
            if !message.is_bot() {
                return None;
            }
            if !message.choices.is_empty() {
                return Some(&message.choices);
            }
        }
        None
    }

    /// Resolve the display label for an option value on the latest prompt.
    pub fn label_for(&self, value: &str) -> Option<&str> {
        self.last_options_prompt()?
            .iter()
            .find(|c| c.value == value)
            .map(|c| c.label.as_str())
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

//! Chat messages and the append-only message log.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Who authored a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    /// The person typing into the widget.
    User,
    /// The question-answering backend (or a canned fallback).
    Bot,
}

impl Sender {
    /// Style class used when rendering messages from this sender.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Bot => "bot",
        }
    }
}

/// A single chat message.
///
/// Text is guaranteed non-empty; it is stored exactly as submitted
/// (no trimming).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    sender: Sender,
    text: String,
}

impl Message {
    /// Create a message, rejecting empty text.
    pub fn new(sender: Sender, text: impl Into<String>) -> Result<Self> {
        let text = text.into();
        if text.is_empty() {
            return Err(Error::EmptyMessage);
        }
        Ok(Self { sender, text })
    }

    /// Create a user message.
    pub fn user(text: impl Into<String>) -> Result<Self> {
        Self::new(Sender::User, text)
    }

    /// Create a bot message.
    pub fn bot(text: impl Into<String>) -> Result<Self> {
        Self::new(Sender::Bot, text)
    }

    #[must_use]
    pub fn sender(&self) -> Sender {
        self.sender
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }
}

/// Ordered history of the messages exchanged in one widget instance.
///
/// Entries are only ever appended. Nothing outside this crate can push,
/// reorder or edit them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct MessageLog {
    messages: Vec<Message>,
}

impl MessageLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    #[must_use]
    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[Message] {
        &self.messages
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Message> {
        self.messages.iter()
    }
}

impl<'a> IntoIterator for &'a MessageLog {
    type Item = &'a Message;
    type IntoIter = std::slice::Iter<'a, Message>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

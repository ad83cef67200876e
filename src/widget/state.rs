//! Widget interaction state machine.

use std::collections::BTreeSet;

use serde::Serialize;

use super::message::{Message, MessageLog};
use super::outcome::Outcome;

/// Identifies one submission so its reply can be attributed when it settles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct SubmissionId(u64);

impl std::fmt::Display for SubmissionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A question handed to the network client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub id: SubmissionId,
    /// Exactly the draft as typed, untrimmed.
    pub question: String,
}

/// State of one chat widget.
///
/// Rendering is a pure function of this struct; every transition below is
/// synchronous and I/O free. Overlapping submissions are allowed, and the
/// loading flag stays set while any of them is outstanding.
#[derive(Debug, Clone, Default)]
pub struct ChatWidget {
    open: bool,
    log: MessageLog,
    draft: String,
    pending: BTreeSet<SubmissionId>,
    next_id: u64,
}

impl ChatWidget {
    /// A closed widget with an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Flip between open and closed.
    pub fn toggle(&mut self) {
        self.open = !self.open;
    }

    pub fn open(&mut self) {
        self.open = true;
    }

    pub fn close(&mut self) {
        self.open = false;
    }

    #[must_use]
    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn set_draft(&mut self, text: impl Into<String>) {
        self.draft = text.into();
    }

    #[must_use]
    pub fn messages(&self) -> &MessageLog {
        &self.log
    }

    /// True while at least one submission is waiting for its reply.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Number of submissions still waiting for a reply.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Submit the current draft.
    ///
    /// Returns `None` and changes nothing when the draft is blank. Otherwise
    /// logs the user message, clears the draft and marks the submission
    /// outstanding.
    pub fn submit(&mut self) -> Option<Submission> {
        if self.draft.trim().is_empty() {
            return None;
        }

        // Non-blank, so never empty.
        let message = Message::user(self.draft.clone()).ok()?;
        self.log.push(message);
        let question = std::mem::take(&mut self.draft);

        let id = SubmissionId(self.next_id);
        self.next_id += 1;
        self.pending.insert(id);

        Some(Submission { id, question })
    }

    /// Key press in the input field. Only `Enter` submits.
    pub fn key_press(&mut self, key: &str) -> Option<Submission> {
        if key == "Enter" { self.submit() } else { None }
    }

    /// Append the bot reply for `id` and clear it from the outstanding set.
    ///
    /// Returns `false` (and appends nothing) if `id` is unknown or already
    /// settled.
    pub fn settle(&mut self, id: SubmissionId, outcome: &Outcome) -> bool {
        if !self.pending.remove(&id) {
            return false;
        }
        // Replies are never empty: `Answered` requires a non-empty answer.
        if let Ok(message) = Message::bot(outcome.reply_text()) {
            self.log.push(message);
        }
        true
    }
}

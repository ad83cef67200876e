//! How a submitted question settled.

use crate::client::QueryResponse;

/// Bot reply when the backend returned no answer.
pub const NOT_FOUND_REPLY: &str = "Sorry, I couldn't find an answer.";

/// Bot reply when the request itself failed.
pub const ERROR_REPLY: &str = "Sorry, there was an error processing your request.";

/// Result of one question/answer round trip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The backend produced a non-empty answer.
    Answered(String),
    /// The backend responded but `answer` was absent or empty.
    NotFound,
    /// Transport, status or parse failure.
    Failed,
}

impl Outcome {
    /// Classify a successfully parsed response.
    #[must_use]
    pub fn from_response(response: QueryResponse) -> Self {
        match response.answer {
            Some(answer) if !answer.is_empty() => Self::Answered(answer),
            _ => Self::NotFound,
        }
    }

    /// Text of the bot message appended for this outcome.
    #[must_use]
    pub fn reply_text(&self) -> &str {
        match self {
            Self::Answered(answer) => answer,
            Self::NotFound => NOT_FOUND_REPLY,
            Self::Failed => ERROR_REPLY,
        }
    }

    /// Short label for logs.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Answered(_) => "answered",
            Self::NotFound => "not_found",
            Self::Failed => "failed",
        }
    }
}

//! Error types for the widget and its network client.

use thiserror::Error;

/// Crate error type.
#[derive(Error, Debug)]
pub enum Error {
    /// HTTP request failed (connection refused, reset, timeout, ...).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Invalid URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The query endpoint answered with a non-success status.
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Response body, if any.
        message: String,
    },

    /// Message text was empty at creation.
    #[error("Message text cannot be empty")]
    EmptyMessage,
}

/// Result type alias for crate operations.
pub type Result<T> = std::result::Result<T, Error>;

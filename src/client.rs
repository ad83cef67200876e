//! Question-answering client.
//!
//! The widget talks to its backend through [`QueryClient`] so the endpoint
//! can be configured per environment and swapped for a double in tests.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{Error, Result};
use crate::widget::Outcome;

/// Endpoint used when none is configured.
pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:3000/query/";

/// Request body sent to the query endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryRequest {
    pub question: String,
}

/// Response body from the query endpoint. Extra fields are ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueryResponse {
    #[serde(default)]
    pub answer: Option<String>,
}

/// Something that can answer a question.
#[async_trait]
pub trait QueryClient: Send + Sync {
    /// Ask one question. Called exactly once per submission.
    async fn ask(&self, question: &str) -> Result<QueryResponse>;
}

/// [`QueryClient`] backed by `POST <endpoint>` with a JSON body.
#[derive(Debug, Clone)]
pub struct HttpQueryClient {
    endpoint: Url,
    http: reqwest::Client,
}

impl HttpQueryClient {
    /// Create a client for `endpoint`.
    pub fn new(endpoint: impl AsRef<str>) -> Result<Self> {
        let endpoint = Url::parse(endpoint.as_ref())?;
        Ok(Self {
            endpoint,
            http: reqwest::Client::new(),
        })
    }

    /// Create a client with a custom reqwest client.
    pub fn with_client(endpoint: Url, http: reqwest::Client) -> Self {
        Self { endpoint, http }
    }

    /// Create a client whose requests give up after `timeout`.
    ///
    /// Without this, a hung backend keeps the submission outstanding forever.
    pub fn with_timeout(endpoint: Url, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(endpoint, http))
    }

    /// Get the endpoint URL.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl QueryClient for HttpQueryClient {
    async fn ask(&self, question: &str) -> Result<QueryResponse> {
        let body = QueryRequest {
            question: question.to_string(),
        };

        // `.json()` sets `Content-Type: application/json`.
        let response = self
            .http
            .post(self.endpoint.clone())
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".into());
            return Err(Error::Api {
                status: status.as_u16(),
                message,
            });
        }

        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

/// Turn a client result into an [`Outcome`], logging failures.
///
/// The error is recorded for diagnostics only and never reaches the user.
pub fn resolve(result: Result<QueryResponse>) -> Outcome {
    match result {
        Ok(response) => Outcome::from_response(response),
        Err(e) => {
            tracing::warn!(name: "query.failed", error = %e, "Error fetching response");
            Outcome::Failed
        }
    }
}

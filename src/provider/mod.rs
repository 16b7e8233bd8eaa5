//! Completion providers.
//!
//! A provider turns a prompt into a complete response text. The chat client
//! talks to the relay backend; the backend talks to Gemini or OpenAI.

mod gemini;
mod openai;
mod relay;

use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use thiserror::Error;

pub use gemini::{GeminiClient, DEFAULT_GEMINI_MODEL};
pub use openai::{OpenAiClient, OpenAiOptions, DEFAULT_OPENAI_MODEL};
pub use relay::{RelayClient, RelayRoute};

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Provider returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("Malformed response: {0}")]
    MalformedBody(String),
    #[error("{0} API key is not configured")]
    NotConfigured(&'static str),
    #[error("Request timed out after {0:?}")]
    TimedOut(Duration),
}

/// Something that answers a prompt with a complete text.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    async fn complete(&self, prompt: &str) -> Result<String, ProviderError>;
}

/// Check the status and decode a JSON body.
///
/// Non-success statuses and undecodable bodies become provider errors.
pub(crate) async fn read_json<T: DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, ProviderError> {
    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        return Err(ProviderError::Status {
            status: status.as_u16(),
            body,
        });
    }
    parse_json(&body)
}

pub(crate) fn parse_json<T: DeserializeOwned>(body: &str) -> Result<T, ProviderError> {
    serde_json::from_str(body).map_err(|e| ProviderError::MalformedBody(e.to_string()))
}

//! Client for the relay backend.
//!
//! Posts `{prompt}` and reads `{bot}` from `/gemini` or `{response}` from
//! `/openai`.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{parse_json, CompletionProvider, ProviderError};

/// Backend route to relay prompts through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum RelayRoute {
    #[default]
    Gemini,
    #[value(name = "openai")]
    OpenAi,
}

impl RelayRoute {
    pub fn path(&self) -> &'static str {
        match self {
            RelayRoute::Gemini => "/gemini",
            RelayRoute::OpenAi => "/openai",
        }
    }
}

impl fmt::Display for RelayRoute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RelayRoute::Gemini => write!(f, "gemini"),
            RelayRoute::OpenAi => write!(f, "openai"),
        }
    }
}

#[derive(Serialize)]
struct RelayRequest<'a> {
    prompt: &'a str,
}

#[derive(Deserialize)]
struct RelayReply {
    bot: Option<String>,
    response: Option<String>,
}

/// Extract the answer for `route` from a success body. The text is trimmed.
fn parse_reply(route: RelayRoute, body: &str) -> Result<String, ProviderError> {
    let reply: RelayReply = parse_json(body)?;
    let text = match route {
        RelayRoute::Gemini => reply.bot,
        RelayRoute::OpenAi => reply.response,
    };
    text.map(|t| t.trim().to_string()).ok_or_else(|| {
        ProviderError::MalformedBody(format!("missing text field for {} route", route))
    })
}

/// Completion provider backed by the relay server.
#[derive(Debug, Clone)]
pub struct RelayClient {
    base_url: String,
    route: RelayRoute,
    client: reqwest::Client,
}

impl RelayClient {
    pub fn new(base_url: impl Into<String>, route: RelayRoute) -> Self {
        Self {
            base_url: base_url.into(),
            route,
            client: reqwest::Client::new(),
        }
    }

    pub fn route(&self) -> RelayRoute {
        self.route
    }

    /// Full URL of the configured route.
    pub fn endpoint(&self) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), self.route.path())
    }
}

#[async_trait]
impl CompletionProvider for RelayClient {
    fn name(&self) -> &str {
        "relay"
    }

    async fn complete(&self, prompt: &str) -> Result<String, ProviderError> {
        let url = self.endpoint();
        tracing::debug!(%url, "relaying prompt");

        let response = self
            .client
            .post(&url)
            .json(&RelayRequest { prompt })
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(ProviderError::Status {
                status: status.as_u16(),
                body,
            });
        }
        parse_reply(self.route, &body)
    }
}

//! OpenAI chat completions client.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{read_json, CompletionProvider, ProviderError};

pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o";

const OPENAI_CHAT_URL: &str = "https://api.openai.com/v1/chat/completions";

/// Sampling options sent with every request.
#[derive(Debug, Clone, PartialEq)]
pub struct OpenAiOptions {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub top_p: f32,
    pub frequency_penalty: f32,
    pub presence_penalty: f32,
}

impl Default for OpenAiOptions {
    fn default() -> Self {
        Self {
            model: DEFAULT_OPENAI_MODEL.to_string(),
            temperature: 0.0,
            max_tokens: 100,
            top_p: 1.0,
            frequency_penalty: 0.5,
            presence_penalty: 0.0,
        }
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<RequestMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
    top_p: f32,
    frequency_penalty: f32,
    presence_penalty: f32,
}

#[derive(Serialize)]
struct RequestMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

impl ChatResponse {
    fn into_text(self) -> Result<String, ProviderError> {
        self.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| ProviderError::MalformedBody("no message content in response".into()))
    }
}

/// Direct OpenAI client used by the relay server.
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    api_key: Option<String>,
    options: OpenAiOptions,
    url: String,
    client: reqwest::Client,
}

impl OpenAiClient {
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            api_key: api_key.filter(|k| !k.is_empty()),
            options: OpenAiOptions::default(),
            url: OPENAI_CHAT_URL.to_string(),
            client: reqwest::Client::new(),
        }
    }

    pub fn with_options(mut self, options: OpenAiOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &OpenAiOptions {
        &self.options
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    fn request<'a>(&'a self, prompt: &'a str) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.options.model,
            messages: vec![RequestMessage {
                role: "user",
                content: prompt,
            }],
            temperature: self.options.temperature,
            max_tokens: self.options.max_tokens,
            top_p: self.options.top_p,
            frequency_penalty: self.options.frequency_penalty,
            presence_penalty: self.options.presence_penalty,
        }
    }
}

#[async_trait]
impl CompletionProvider for OpenAiClient {
    fn name(&self) -> &str {
        "openai"
    }

    async fn complete(&self, prompt: &str) -> Result<String, ProviderError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(ProviderError::NotConfigured("OpenAI"))?;

        tracing::debug!(model = %self.options.model, "calling OpenAI");
        let response = self
            .client
            .post(&self.url)
            .bearer_auth(api_key)
            .json(&self.request(prompt))
            .send()
            .await?;

        let body: ChatResponse = read_json(response).await?;
        body.into_text()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::parse_json;

    #[test]
    fn test_default_options() {
        let options = OpenAiOptions::default();
        assert_eq!(options.model, "gpt-4o");
        assert_eq!(options.temperature, 0.0);
        assert_eq!(options.max_tokens, 100);
        assert_eq!(options.top_p, 1.0);
        assert_eq!(options.frequency_penalty, 0.5);
        assert_eq!(options.presence_penalty, 0.0);
    }

    #[test]
    fn test_request_shape() {
        let client = OpenAiClient::new(Some("key".into()));
        let json = serde_json::to_value(client.request("hello")).unwrap();
        assert_eq!(json["model"], "gpt-4o");
        assert_eq!(json["max_tokens"], 100);
        assert_eq!(json["frequency_penalty"], 0.5);
        assert_eq!(
            json["messages"],
            serde_json::json!([{"role": "user", "content": "hello"}])
        );
    }

    #[test]
    fn test_response_text() {
        let body: ChatResponse = parse_json(
            r#"{"choices":[{"index":0,"message":{"role":"assistant","content":"hi"}}]}"#,
        )
        .unwrap();
        assert_eq!(body.into_text().unwrap(), "hi");
    }

    #[test]
    fn test_response_without_content() {
        let body: ChatResponse =
            parse_json(r#"{"choices":[{"message":{"role":"assistant","content":null}}]}"#)
                .unwrap();
        assert!(matches!(
            body.into_text(),
            Err(ProviderError::MalformedBody(_))
        ));
    }

    #[test]
    fn test_custom_options_are_sent() {
        let client = OpenAiClient::new(Some("key".into())).with_options(OpenAiOptions {
            model: "gpt-4o-mini".into(),
            max_tokens: 256,
            ..OpenAiOptions::default()
        });
        assert_eq!(client.options().max_tokens, 256);
        let json = serde_json::to_value(client.request("x")).unwrap();
        assert_eq!(json["model"], "gpt-4o-mini");
        assert_eq!(json["max_tokens"], 256);
    }

    #[tokio::test]
    async fn test_complete_without_key_fails_fast() {
        let client = OpenAiClient::new(None);
        assert!(!client.is_configured());
        let err = client.complete("hi").await.unwrap_err();
        assert!(matches!(err, ProviderError::NotConfigured("OpenAI")));
    }
}

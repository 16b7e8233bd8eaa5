use serde::{Deserialize, Serialize};

/// Body of every prompt route.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PromptRequest {
    #[serde(default)]
    pub prompt: String,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct HealthReply {
    pub message: String,
}

/// Success body of `/gemini`.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct BotReply {
    pub bot: String,
}

/// Success body of `/openai`.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct TextReply {
    pub response: String,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct ErrorReply {
    pub error: String,
}

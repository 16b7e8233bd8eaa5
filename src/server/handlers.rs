use axum::{extract::State, http::StatusCode, Json};

use super::types::{BotReply, ErrorReply, HealthReply, PromptRequest, TextReply};
use super::ServerState;

pub const HEALTH_MESSAGE: &str = "Hello from Codex!";
pub const GEMINI_FAILURE: &str = "Failed to generate response.";

type Failure = (StatusCode, Json<ErrorReply>);

fn failure(error: impl Into<String>) -> Failure {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorReply {
            error: error.into(),
        }),
    )
}

/// `GET /`
pub async fn handle_health() -> Json<HealthReply> {
    Json(HealthReply {
        message: HEALTH_MESSAGE.to_string(),
    })
}

/// `POST /gemini`
///
/// Provider errors are logged and answered with a fixed message.
pub async fn handle_gemini(
    State(state): State<ServerState>,
    Json(req): Json<PromptRequest>,
) -> Result<Json<BotReply>, Failure> {
    match state.gemini.complete(&req.prompt).await {
        Ok(bot) => Ok(Json(BotReply { bot })),
        Err(e) => {
            tracing::error!(provider = state.gemini.name(), error = %e, "error calling Gemini API");
            Err(failure(GEMINI_FAILURE))
        }
    }
}

/// `POST /openai`, also mounted at `POST /`
///
/// Provider errors are answered with their message.
pub async fn handle_openai(
    State(state): State<ServerState>,
    Json(req): Json<PromptRequest>,
) -> Result<Json<TextReply>, Failure> {
    match state.openai.complete(&req.prompt).await {
        Ok(response) => Ok(Json(TextReply { response })),
        Err(e) => {
            tracing::error!(provider = state.openai.name(), error = %e, "error calling OpenAI API");
            Err(failure(e.to_string()))
        }
    }
}

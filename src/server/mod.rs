//! Relay backend.
//!
//! Exposes `GET /`, `POST /gemini`, `POST /openai` and the legacy `POST /`
//! alias, forwarding prompts to the configured completion providers.
//! CORS is fully open so browser clients on any origin can call it.

mod handlers;
mod types;

use std::future::Future;
use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use thiserror::Error;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;

use crate::provider::{CompletionProvider, GeminiClient, OpenAiClient};
use handlers::{handle_gemini, handle_health, handle_openai};

pub use handlers::{GEMINI_FAILURE, HEALTH_MESSAGE};
pub use types::{BotReply, ErrorReply, HealthReply, PromptRequest, TextReply};

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Server error: {0}")]
    Serve(#[from] std::io::Error),
}

/// State shared between request handlers
#[derive(Clone)]
pub struct ServerState {
    gemini: Arc<dyn CompletionProvider>,
    openai: Arc<dyn CompletionProvider>,
}

/// The relay server
pub struct Server {
    state: ServerState,
}

impl Server {
    pub fn new(gemini: Arc<dyn CompletionProvider>, openai: Arc<dyn CompletionProvider>) -> Self {
        Self {
            state: ServerState { gemini, openai },
        }
    }

    /// Server backed by the real vendor clients.
    pub fn from_clients(gemini: GeminiClient, openai: OpenAiClient) -> Self {
        if !gemini.is_configured() {
            tracing::warn!("GEMINI_API_KEY is not set; /gemini will fail");
        }
        if !openai.is_configured() {
            tracing::warn!("OPENAI_API_KEY is not set; /openai will fail");
        }
        tracing::debug!(
            gemini_model = gemini.model(),
            openai_model = %openai.options().model,
            max_tokens = openai.options().max_tokens,
            "relay providers ready"
        );
        Self::new(Arc::new(gemini), Arc::new(openai))
    }

    pub fn router(&self) -> Router {
        Router::new()
            .route("/", get(handle_health).post(handle_openai))
            .route("/gemini", post(handle_gemini))
            .route("/openai", post(handle_openai))
            .layer(CorsLayer::permissive())
            .with_state(self.state.clone())
    }

    /// Serve on `addr` until Ctrl-C.
    pub async fn run(self, addr: &str) -> Result<(), ServerError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ServerError::Bind {
                addr: addr.to_string(),
                source,
            })?;

        let port = listener.local_addr()?.port();
        println!("Server running on port: http://localhost:{}/", port);
        tracing::info!(addr, "relay server listening");

        self.serve(listener, async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
    }

    /// Serve on an already bound listener until `shutdown` resolves.
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> Result<(), ServerError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{ProviderError, RelayClient, RelayRoute};
    use async_trait::async_trait;
    use serde_json::{json, Value};

    struct Echo;

    #[async_trait]
    impl CompletionProvider for Echo {
        fn name(&self) -> &str {
            "echo"
        }

        async fn complete(&self, prompt: &str) -> Result<String, ProviderError> {
            Ok(format!("echo: {}", prompt))
        }
    }

    struct Broken;

    #[async_trait]
    impl CompletionProvider for Broken {
        fn name(&self) -> &str {
            "broken"
        }

        async fn complete(&self, _prompt: &str) -> Result<String, ProviderError> {
            Err(ProviderError::MalformedBody("no candidates".into()))
        }
    }

    /// Serve `server` on an ephemeral port and return its base URL.
    async fn spawn(server: Server) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(server.serve(listener, std::future::pending()));
        format!("http://{}", addr)
    }

    async fn post(base: &str, path: &str, body: Value) -> (u16, Value) {
        let response = reqwest::Client::new()
            .post(format!("{}{}", base, path))
            .json(&body)
            .send()
            .await
            .unwrap();
        let status = response.status().as_u16();
        (status, response.json().await.unwrap())
    }

    // =========================================================================
    // Routes
    // =========================================================================

    #[tokio::test]
    async fn test_routes_over_http() {
        let base = spawn(Server::new(Arc::new(Echo), Arc::new(Echo))).await;

        let health: Value = reqwest::get(format!("{}/", base))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(health, json!({"message": HEALTH_MESSAGE}));

        assert_eq!(
            post(&base, "/gemini", json!({"prompt": "hi"})).await,
            (200, json!({"bot": "echo: hi"}))
        );
        assert_eq!(
            post(&base, "/openai", json!({"prompt": "hi"})).await,
            (200, json!({"response": "echo: hi"}))
        );
        assert_eq!(
            post(&base, "/", json!({"prompt": "legacy"})).await,
            (200, json!({"response": "echo: legacy"}))
        );
    }

    #[tokio::test]
    async fn test_failures_answer_500_with_error_body() {
        let base = spawn(Server::new(Arc::new(Broken), Arc::new(Broken))).await;

        assert_eq!(
            post(&base, "/gemini", json!({"prompt": "hi"})).await,
            (500, json!({"error": GEMINI_FAILURE}))
        );

        let (status, body) = post(&base, "/openai", json!({"prompt": "hi"})).await;
        assert_eq!(status, 500);
        assert!(body["error"].as_str().unwrap().contains("no candidates"));

        let relay = RelayClient::new(base, RelayRoute::Gemini);
        assert!(matches!(
            relay.complete("hi").await,
            Err(ProviderError::Status { status: 500, .. })
        ));
    }

    #[tokio::test]
    async fn test_relay_client_reads_both_routes() {
        let base = spawn(Server::new(Arc::new(Echo), Arc::new(Echo))).await;

        let gemini = RelayClient::new(base.clone(), RelayRoute::Gemini);
        assert_eq!(gemini.complete("one").await.unwrap(), "echo: one");

        let openai = RelayClient::new(base, RelayRoute::OpenAi);
        assert_eq!(openai.complete("two").await.unwrap(), "echo: two");
    }

    #[tokio::test]
    async fn test_unconfigured_vendor_clients_fail_as_providers() {
        let server = Server::from_clients(GeminiClient::new(None), OpenAiClient::new(None));
        let base = spawn(server).await;

        assert_eq!(
            post(&base, "/gemini", json!({"prompt": "hi"})).await,
            (500, json!({"error": GEMINI_FAILURE}))
        );
        let (status, body) = post(&base, "/", json!({"prompt": "hi"})).await;
        assert_eq!(status, 500);
        assert!(body["error"].as_str().unwrap().contains("OpenAI"));
    }

    #[tokio::test]
    async fn test_bind_error_names_address() {
        let err = Server::new(Arc::new(Echo), Arc::new(Echo))
            .run("not-an-address")
            .await
            .unwrap_err();
        assert!(matches!(err, ServerError::Bind { .. }));
        assert!(err.to_string().contains("not-an-address"));
    }
}

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use super::{
    dto::{ChatMessage, CompletionRequest, CompletionResponse, Role},
    transport::ChatTransport,
};
use crate::config::OpenAiConfig;

/// System-role instruction sent ahead of every user message.
pub const PERSONA_PROMPT: &str = "Вы находитесь в мире Гарри Поттера. Общайтесь вежливо на 'вы' и используйте речевые обороты, характерные для книг и фильмов о Гарри Поттере.";

#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("API key not set, provide it in OPENAI_API_KEY")]
    MissingApiKey,
    #[error("encode completion request: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("completion transport: {0:#}")]
    Transport(#[source] anyhow::Error),
    #[error("decode completion response: {0}")]
    Decode(#[source] serde_json::Error),
    #[error("no choices returned by completion backend")]
    NoChoices,
}

/// Turns a user message into a persona reply through the completion backend.
#[derive(Clone)]
pub struct CompletionClient {
    transport: Arc<dyn ChatTransport>,
    api_key: Option<String>,
    api_url: String,
    model: String,
}

impl CompletionClient {
    pub fn new(config: &OpenAiConfig, transport: Arc<dyn ChatTransport>) -> Self {
        Self {
            transport,
            api_key: config.api_key.clone(),
            api_url: config.api_url.clone(),
            model: config.model.clone(),
        }
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    fn build_request(&self, message: &str) -> CompletionRequest {
        CompletionRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: Role::System,
                    content: PERSONA_PROMPT.to_string(),
                },
                ChatMessage {
                    role: Role::User,
                    content: message.to_string(),
                },
            ],
        }
    }

    /// Single attempt, no retries. The credential is checked before anything
    /// is sent.
    #[instrument(skip_all, fields(model = %self.model))]
    pub async fn complete(&self, message: &str) -> Result<String, CompletionError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(CompletionError::MissingApiKey)?;

        let body = serde_json::to_vec(&self.build_request(message))
            .map_err(CompletionError::Encode)?;

        info!("sending completion request");
        let raw = self
            .transport
            .post_json(&self.api_url, api_key, body)
            .await
            .map_err(CompletionError::Transport)?;
        debug!(bytes = raw.len(), "completion response received");

        let response: CompletionResponse =
            serde_json::from_slice(&raw).map_err(CompletionError::Decode)?;
        response.into_first_content().ok_or_else(|| {
            warn!("completion response has no choices");
            CompletionError::NoChoices
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::completion::testing::StubTransport;
    use crate::config::{DEFAULT_API_URL, DEFAULT_MODEL};

    fn config(api_key: Option<&str>) -> OpenAiConfig {
        OpenAiConfig {
            api_key: api_key.map(str::to_string),
            api_url: DEFAULT_API_URL.into(),
            model: DEFAULT_MODEL.into(),
        }
    }

    #[tokio::test]
    async fn returns_first_choice_content() {
        let stub = StubTransport::replying(
            r#"{"choices":[{"message":{"content":"Добрый день"}},{"message":{"content":"second"}}]}"#,
        );
        let client = CompletionClient::new(&config(Some("sk-test")), stub.clone());

        let reply = client.complete("hello").await.unwrap();
        assert_eq!(reply, "Добрый день");
        assert_eq!(stub.calls(), 1);
    }

    #[tokio::test]
    async fn request_carries_persona_user_text_and_credential() {
        let stub = StubTransport::replying(r#"{"choices":[{"message":{"content":"ok"}}]}"#);
        let client = CompletionClient::new(&config(Some("sk-test")), stub.clone());
        client.complete("hello").await.unwrap();

        let sent = stub.last_request().expect("one request");
        assert_eq!(sent.url, DEFAULT_API_URL);
        assert_eq!(sent.api_key, "sk-test");

        let body: serde_json::Value = serde_json::from_slice(&sent.body).unwrap();
        assert_eq!(body["model"], DEFAULT_MODEL);
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][0]["content"], PERSONA_PROMPT);
        assert_eq!(body["messages"][1]["role"], "user");
        assert_eq!(body["messages"][1]["content"], "hello");
        assert_eq!(body["messages"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn missing_api_key_fails_without_network_call() {
        let stub = StubTransport::replying(r#"{"choices":[{"message":{"content":"ok"}}]}"#);
        let client = CompletionClient::new(&config(None), stub.clone());

        let err = client.complete("hello").await.unwrap_err();
        assert!(matches!(err, CompletionError::MissingApiKey));
        assert_eq!(stub.calls(), 0);
    }

    #[tokio::test]
    async fn zero_choices_is_an_error() {
        let stub = StubTransport::replying(r#"{"choices":[]}"#);
        let client = CompletionClient::new(&config(Some("k")), stub);
        let err = client.complete("hello").await.unwrap_err();
        assert!(matches!(err, CompletionError::NoChoices));
    }

    #[tokio::test]
    async fn upstream_error_body_counts_as_zero_choices() {
        let stub = StubTransport::replying(r#"{"error":{"message":"invalid api key"}}"#);
        let client = CompletionClient::new(&config(Some("k")), stub);
        let err = client.complete("hello").await.unwrap_err();
        assert!(matches!(err, CompletionError::NoChoices));
    }

    #[tokio::test]
    async fn malformed_body_is_a_decode_error() {
        let stub = StubTransport::replying("<html>bad gateway</html>");
        let client = CompletionClient::new(&config(Some("k")), stub);
        let err = client.complete("hello").await.unwrap_err();
        assert!(matches!(err, CompletionError::Decode(_)));
    }

    #[tokio::test]
    async fn transport_failure_is_surfaced_once() {
        let stub = StubTransport::failing("connection refused");
        let client = CompletionClient::new(&config(Some("k")), stub.clone());
        let err = client.complete("hello").await.unwrap_err();
        assert!(matches!(err, CompletionError::Transport(_)));
        assert!(err.to_string().contains("connection refused"));
        assert_eq!(stub.calls(), 1);
    }
}

//! OpenAI Completion Client - `CompletionClient` over the Chat Completions API.
//!
//! One attempt per call with the configured timeout. The credential check
//! runs before any request is built, so an unconfigured deployment never
//! touches the network.
//!
//! # Configuration
//!
//! ```ignore
//! let client = OpenAiCompletionClient::new(&config.ai)?;
//! let text = client.complete(request).await?;
//! ```

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::AiConfig;
use crate::ports::{
    ChatMessage, CompletionClient, CompletionError, CompletionRequest, UpstreamErrorKind,
};

/// Message used when the provider gives no error text of its own.
pub const FALLBACK_UPSTREAM_MESSAGE: &str = "Invalid response from completion provider";

/// Chat Completions client.
pub struct OpenAiCompletionClient {
    api_key: Option<SecretString>,
    model: String,
    base_url: String,
    max_tokens: u32,
    temperature: f32,
    history_limit: usize,
    timeout: Duration,
    client: Client,
}

impl OpenAiCompletionClient {
    /// Creates a client from the completion provider configuration.
    ///
    /// # Errors
    ///
    /// Fails only if the HTTP client cannot be initialised (TLS backend).
    pub fn new(config: &AiConfig) -> Result<Self, reqwest::Error> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.expose_secret().trim().is_empty());

        let client = Client::builder().timeout(config.timeout()).build()?;

        Ok(Self {
            api_key,
            model: config.model.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            history_limit: config.history_limit,
            timeout: config.timeout(),
            client,
        })
    }

    /// Overrides the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self, reqwest::Error> {
        self.client = Client::builder().timeout(timeout).build()?;
        self.timeout = timeout;
        Ok(self)
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    fn to_wire_request(&self, request: &CompletionRequest) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: self.model.clone(),
            messages: request.to_chat_messages(self.history_limit),
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        }
    }

    fn map_transport_error(&self, err: reqwest::Error) -> CompletionError {
        if err.is_timeout() {
            CompletionError::transport(
                format!("request timed out after {}s", self.timeout.as_secs_f32()),
                true,
            )
        } else if err.is_connect() {
            CompletionError::transport(format!("connection failed: {}", err), false)
        } else {
            CompletionError::transport(err.to_string(), false)
        }
    }
}

#[async_trait]
impl CompletionClient for OpenAiCompletionClient {
    async fn complete(&self, request: CompletionRequest) -> Result<String, CompletionError> {
        let api_key = self
            .api_key
            .as_ref()
            .ok_or(CompletionError::MissingCredential)?;

        let body = self.to_wire_request(&request);
        tracing::debug!(
            model = %self.model,
            messages = body.messages.len(),
            "sending completion request"
        );

        let response = self
            .client
            .post(self.completions_url())
            .bearer_auth(api_key.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        parse_completion(status, &text)
    }
}

/// Interprets a provider response.
///
/// Success requires a non-blank `choices[0].message.content`; anything else
/// is an upstream error carrying `error.message` when the payload has one.
fn parse_completion(status: StatusCode, body: &str) -> Result<String, CompletionError> {
    let parsed = serde_json::from_str::<ChatCompletionResponse>(body);

    let kind = match status.as_u16() {
        401 | 403 => UpstreamErrorKind::Authentication,
        429 => UpstreamErrorKind::RateLimited,
        _ if parsed.is_err() || status.is_success() => UpstreamErrorKind::MalformedResponse,
        _ => UpstreamErrorKind::Provider,
    };

    let payload = match parsed {
        Ok(payload) => payload,
        Err(err) => {
            tracing::debug!(%status, error = %err, "completion body is not valid JSON");
            return Err(CompletionError::upstream(kind, FALLBACK_UPSTREAM_MESSAGE));
        }
    };

    let content = payload
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message)
        .and_then(|message| message.content)
        .map(|content| content.trim().to_string())
        .filter(|content| !content.is_empty());

    match content {
        Some(content) => Ok(content),
        None => {
            let message = payload
                .error
                .and_then(|e| e.message)
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| FALLBACK_UPSTREAM_MESSAGE.to_string());
            Err(CompletionError::upstream(kind, message))
        }
    }
}

// ----- OpenAI API Types -----

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
    error: Option<ApiErrorBody>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: Option<ChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::HistoryEntry;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config_for(server: &MockServer) -> AiConfig {
        AiConfig {
            api_key: Some(SecretString::new("sk-test-key".to_string())),
            base_url: server.uri(),
            ..Default::default()
        }
    }

    fn request() -> CompletionRequest {
        CompletionRequest::new(
            "Be helpful.",
            vec![HistoryEntry::new("Hi", Some("Hello! How can I help?".to_string()))],
            "Where is my order?",
        )
    }

    fn success_body(content: &str) -> serde_json::Value {
        json!({
            "id": "chatcmpl-1",
            "model": "gpt-4o-mini",
            "choices": [{
                "index": 0,
                "message": { "role": "assistant", "content": content },
                "finish_reason": "stop"
            }]
        })
    }

    #[tokio::test]
    async fn sends_bearer_model_and_messages() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer sk-test-key"))
            .and(body_partial_json(json!({
                "model": "gpt-4o-mini",
                "max_tokens": 500,
                "messages": [
                    { "role": "system", "content": "Be helpful." },
                    { "role": "user", "content": "Hi" },
                    { "role": "assistant", "content": "Hello! How can I help?" },
                    { "role": "user", "content": "Where is my order?" }
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(success_body("  It ships today.  ")))
            .expect(1)
            .mount(&server)
            .await;

        let client = OpenAiCompletionClient::new(&config_for(&server)).unwrap();
        let text = client.complete(request()).await.unwrap();

        assert_eq!(text, "It ships today.");
    }

    #[tokio::test]
    async fn history_is_truncated_to_configured_limit() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(success_body("ok")))
            .mount(&server)
            .await;

        let history = (0..15)
            .map(|i| HistoryEntry::new(format!("q{}", i), Some(format!("a{}", i))))
            .collect();
        let client = OpenAiCompletionClient::new(&config_for(&server)).unwrap();
        client
            .complete(CompletionRequest::new("sys", history, "new"))
            .await
            .unwrap();

        let received = server.received_requests().await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&received[0].body).unwrap();
        let messages = body["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 1 + 10 * 2 + 1);
        assert_eq!(messages[1]["content"], "q5");
    }

    #[tokio::test]
    async fn missing_credential_makes_no_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(success_body("unused")))
            .expect(0)
            .mount(&server)
            .await;

        let config = AiConfig {
            api_key: None,
            ..config_for(&server)
        };
        let client = OpenAiCompletionClient::new(&config).unwrap();

        assert_eq!(
            client.complete(request()).await,
            Err(CompletionError::MissingCredential)
        );
    }

    #[tokio::test]
    async fn provider_error_message_is_passed_through() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_json(json!({
                "error": { "message": "Rate limit reached for gpt-4o-mini", "type": "requests" }
            })))
            .mount(&server)
            .await;

        let client = OpenAiCompletionClient::new(&config_for(&server)).unwrap();
        let err = client.complete(request()).await.unwrap_err();

        assert_eq!(
            err,
            CompletionError::upstream(
                UpstreamErrorKind::RateLimited,
                "Rate limit reached for gpt-4o-mini"
            )
        );
    }

    #[tokio::test]
    async fn unauthorized_maps_to_authentication_kind() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "error": { "message": "Incorrect API key provided" }
            })))
            .mount(&server)
            .await;

        let client = OpenAiCompletionClient::new(&config_for(&server)).unwrap();
        let err = client.complete(request()).await.unwrap_err();

        assert!(matches!(
            err,
            CompletionError::Upstream { kind: UpstreamErrorKind::Authentication, .. }
        ));
    }

    #[tokio::test]
    async fn success_without_content_uses_fallback_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "choices": [] })))
            .mount(&server)
            .await;

        let client = OpenAiCompletionClient::new(&config_for(&server)).unwrap();
        let err = client.complete(request()).await.unwrap_err();

        assert_eq!(
            err,
            CompletionError::upstream(UpstreamErrorKind::MalformedResponse, FALLBACK_UPSTREAM_MESSAGE)
        );
    }

    #[tokio::test]
    async fn blank_content_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(success_body("  \n\t ")))
            .mount(&server)
            .await;

        let client = OpenAiCompletionClient::new(&config_for(&server)).unwrap();
        let err = client.complete(request()).await.unwrap_err();

        assert_eq!(
            err,
            CompletionError::upstream(UpstreamErrorKind::MalformedResponse, FALLBACK_UPSTREAM_MESSAGE)
        );
    }

    #[tokio::test]
    async fn non_json_body_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(502).set_body_string("<html>Bad gateway</html>"))
            .mount(&server)
            .await;

        let client = OpenAiCompletionClient::new(&config_for(&server)).unwrap();
        let err = client.complete(request()).await.unwrap_err();

        assert!(matches!(
            err,
            CompletionError::Upstream { kind: UpstreamErrorKind::MalformedResponse, .. }
        ));
    }

    #[tokio::test]
    async fn slow_provider_times_out_as_transport_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(success_body("too late"))
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&server)
            .await;

        let client = OpenAiCompletionClient::new(&config_for(&server))
            .unwrap()
            .with_timeout(Duration::from_millis(50))
            .unwrap();
        let err = client.complete(request()).await.unwrap_err();

        assert!(matches!(err, CompletionError::Transport { timed_out: true, .. }));
    }

    #[test]
    fn provider_kind_for_server_errors_with_json_body() {
        let err = parse_completion(
            StatusCode::INTERNAL_SERVER_ERROR,
            r#"{"error":{"message":"The server had an error"}}"#,
        )
        .unwrap_err();
        assert_eq!(
            err,
            CompletionError::upstream(UpstreamErrorKind::Provider, "The server had an error")
        );
    }
}

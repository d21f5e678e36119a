//! Generation service: the remote half of the conversion step.
//!
//! [`GenerationService`] is the seam between the batch loop and the hosted
//! chat-completion API. The orchestrator only ever sees the trait, so tests
//! inject a scripted implementation and never touch the network, and callers
//! with unusual needs (proxies, alternative endpoints, middleware) can
//! supply their own client via
//! [`crate::config::ConversionConfigBuilder::service`].
//!
//! [`OpenAiClient`] is the production implementation: one plain (non-streaming)
//! chat-completion request per statement, a system message plus a user
//! message, no retries and no backoff. A failed call surfaces immediately;
//! how that failure affects the rest of the batch is the orchestrator's
//! decision, not this module's.

use crate::error::StatementError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Endpoint for the hosted chat-completion service.
pub const OPENAI_CHAT_COMPLETIONS_URL: &str = "https://api.openai.com/v1/chat/completions";

/// Sampling knobs forwarded with every generation request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationOptions {
    /// Sampling temperature; 0.0 for deterministic conversion output.
    pub temperature: f32,
    /// Upper bound on generated tokens.
    pub max_output_tokens: usize,
}

/// A text-generation backend capable of one chat-completion call.
///
/// Implementations return the raw reply text; the orchestrator trims
/// whitespace before writing it out.
#[async_trait]
pub trait GenerationService: Send + Sync {
    /// Send one system + user instruction pair and return the reply text.
    async fn generate(
        &self,
        system: &str,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<String, StatementError>;
}

// ── Wire types ───────────────────────────────────────────────────────────

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: usize,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
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

// ── OpenAI client ────────────────────────────────────────────────────────

/// [`GenerationService`] backed by the OpenAI chat-completions endpoint.
pub struct OpenAiClient {
    client: reqwest::Client,
    api_key: String,
    model: String,
}

impl OpenAiClient {
    /// Build a client with the given credential, model id, and request
    /// timeout.
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
        timeout_secs: u64,
    ) -> Result<Self, StatementError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| StatementError::Internal(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            api_key: api_key.into(),
            model: model.into(),
        })
    }
}

#[async_trait]
impl GenerationService for OpenAiClient {
    async fn generate(
        &self,
        system: &str,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<String, StatementError> {
        let body = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            max_tokens: options.max_output_tokens,
            temperature: options.temperature,
        };

        debug!(
            "Requesting completion: model={}, prompt={} chars",
            self.model,
            prompt.len()
        );

        let response = self
            .client
            .post(OPENAI_CHAT_COMPLETIONS_URL)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| StatementError::Service {
                message: e.to_string(),
            })?;

        let status = response.status();
        let text = response.text().await.map_err(|e| StatementError::Service {
            message: e.to_string(),
        })?;

        parse_reply(status, &text)
    }
}

/// Map the raw HTTP status and body to a reply string or an error.
///
/// Split out of [`OpenAiClient::generate`] so the status and body handling
/// is unit-testable without a live endpoint.
fn parse_reply(status: reqwest::StatusCode, body: &str) -> Result<String, StatementError> {
    use reqwest::StatusCode;

    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Err(StatementError::Auth {
            detail: format!("HTTP {status}: {body}"),
        });
    }
    if !status.is_success() {
        return Err(StatementError::Service {
            message: format!("HTTP {status}: {body}"),
        });
    }

    let parsed: ChatResponse = serde_json::from_str(body).map_err(|e| StatementError::Service {
        message: format!("malformed response: {e}"),
    })?;

    parsed
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .ok_or_else(|| StatementError::Service {
            message: "response contained no choices".into(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn request_body_carries_model_and_sampling_options() {
        let body = ChatRequest {
            model: "gpt-4o-mini",
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: "You are a helpful assistant.",
                },
                ChatMessage {
                    role: "user",
                    content: "convert this",
                },
            ],
            max_tokens: 10_000,
            temperature: 0.0,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["model"], "gpt-4o-mini");
        assert_eq!(json["max_tokens"], 10_000);
        assert_eq!(json["temperature"], 0.0);
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["role"], "user");
        assert_eq!(json["messages"][1]["content"], "convert this");
    }

    #[test]
    fn successful_reply_is_extracted() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":"Name, Amount"}}]}"#;
        let reply = parse_reply(StatusCode::OK, body).unwrap();
        assert_eq!(reply, "Name, Amount");
    }

    #[test]
    fn unauthorized_maps_to_auth_error() {
        let err = parse_reply(StatusCode::UNAUTHORIZED, "invalid api key").unwrap_err();
        assert!(matches!(err, StatementError::Auth { .. }), "got: {err:?}");
    }

    #[test]
    fn quota_failure_maps_to_service_error() {
        let err = parse_reply(StatusCode::TOO_MANY_REQUESTS, "quota exceeded").unwrap_err();
        match err {
            StatementError::Service { message } => {
                assert!(message.contains("429"), "got: {message}");
                assert!(message.contains("quota exceeded"));
            }
            other => panic!("expected Service, got: {other:?}"),
        }
    }

    #[test]
    fn malformed_body_maps_to_service_error() {
        let err = parse_reply(StatusCode::OK, "not json at all").unwrap_err();
        assert!(matches!(err, StatementError::Service { .. }));
    }

    #[test]
    fn empty_choices_maps_to_service_error() {
        let err = parse_reply(StatusCode::OK, r#"{"choices":[]}"#).unwrap_err();
        match err {
            StatementError::Service { message } => {
                assert!(message.contains("no choices"), "got: {message}");
            }
            other => panic!("expected Service, got: {other:?}"),
        }
    }
}

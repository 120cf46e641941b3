//! `TextGenerator` trait and the `ApiGenerator` implementation.
//!
//! `ApiGenerator` calls any OpenAI-compatible `/v1/chat/completions` endpoint
//! in single-shot (non-streaming) mode.  All connection details come from
//! [`LlmConfig`]; nothing is hardcoded.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::LlmConfig;
use crate::conversation::Role;

// ---------------------------------------------------------------------------
// GenerationError
// ---------------------------------------------------------------------------

/// Errors that can occur while generating text.
#[derive(Debug, Error)]
pub enum GenerationError {
    /// HTTP transport or connection error.
    #[error("HTTP request failed: {0}")]
    Request(String),

    /// The request did not complete within its timeout.
    #[error("generation request timed out")]
    Timeout,

    /// The service answered with a non-2xx status.
    #[error("generation service responded with status {0}")]
    Status(u16),

    /// The HTTP response could not be parsed as expected JSON.
    #[error("failed to parse generation response: {0}")]
    Parse(String),

    /// The response carried no text content at all.
    #[error("generation service returned no content")]
    EmptyResponse,
}

impl From<reqwest::Error> for GenerationError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            GenerationError::Timeout
        } else {
            GenerationError::Request(e.to_string())
        }
    }
}

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// One role-tagged message sent to the generation service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// A system prompt plus the conversation messages.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GenerationRequest {
    pub system_prompt: String,
    pub messages: Vec<ChatMessage>,
}

// ---------------------------------------------------------------------------
// TextGenerator trait
// ---------------------------------------------------------------------------

/// Async single-shot text generation.
///
/// Implementors must be `Send + Sync` so they can be shared across tasks
/// (e.g. wrapped in `Arc<dyn TextGenerator>`).  An empty string is a valid
/// answer and is not an error.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError>;
}

// ---------------------------------------------------------------------------
// ApiGenerator
// ---------------------------------------------------------------------------

/// Calls an OpenAI-compatible `/v1/chat/completions` endpoint.
pub struct ApiGenerator {
    client: reqwest::Client,
    config: LlmConfig,
}

impl ApiGenerator {
    /// Build an `ApiGenerator` from application config.
    ///
    /// The HTTP client carries the transport timeout from
    /// `config.timeout_secs`; a default client is used if the builder fails.
    pub fn from_config(config: &LlmConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            config: config.clone(),
        }
    }

    fn request_body(&self, request: &GenerationRequest) -> serde_json::Value {
        let mut messages = Vec::with_capacity(request.messages.len() + 1);
        messages.push(serde_json::json!({ "role": "system", "content": request.system_prompt }));
        for m in &request.messages {
            messages.push(serde_json::json!({ "role": m.role.as_str(), "content": m.content }));
        }

        serde_json::json!({
            "model":       self.config.model,
            "messages":    messages,
            "stream":      false,
            "temperature": self.config.temperature,
            "max_tokens":  self.config.max_tokens
        })
    }
}

#[async_trait]
impl TextGenerator for ApiGenerator {
    /// The `Authorization: Bearer …` header is attached only when
    /// `config.api_key` is a non-empty string.
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        let url = format!(
            "{}/v1/chat/completions",
            self.config.base_url.trim_end_matches('/')
        );

        let mut req = self.client.post(&url).json(&self.request_body(request));

        let key = self.config.api_key.as_deref().unwrap_or("");
        if !key.is_empty() {
            req = req.bearer_auth(key);
        }

        let response = req.send().await?;
        if !response.status().is_success() {
            return Err(GenerationError::Status(response.status().as_u16()));
        }

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| GenerationError::Parse(e.to_string()))?;

        let content = json["choices"][0]["message"]["content"]
            .as_str()
            .ok_or(GenerationError::EmptyResponse)?;

        Ok(content.trim().to_string())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn make_config(api_key: Option<&str>) -> LlmConfig {
        LlmConfig {
            base_url: "http://localhost:11434/".into(),
            api_key: api_key.map(|s| s.to_string()),
            model: "gpt-4o-mini".into(),
            temperature: 0.4,
            timeout_secs: 10,
            max_tokens: 256,
        }
    }

    #[test]
    fn from_config_accepts_empty_and_real_keys() {
        let _ = ApiGenerator::from_config(&make_config(None));
        let _ = ApiGenerator::from_config(&make_config(Some("")));
        let _ = ApiGenerator::from_config(&make_config(Some("sk-test-1234")));
    }

    #[test]
    fn request_body_puts_system_prompt_first() {
        let generator = ApiGenerator::from_config(&make_config(None));
        let request = GenerationRequest {
            system_prompt: "be a tutor".into(),
            messages: vec![
                ChatMessage::user("bonjour"),
                ChatMessage {
                    role: Role::Assistant,
                    content: "salut".into(),
                },
            ],
        };

        let body = generator.request_body(&request);
        assert_eq!(body["model"], "gpt-4o-mini");
        assert_eq!(body["stream"], false);
        assert_eq!(body["max_tokens"], 256);
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][0]["content"], "be a tutor");
        assert_eq!(body["messages"][1]["role"], "user");
        assert_eq!(body["messages"][2]["role"], "assistant");
        assert_eq!(body["messages"][2]["content"], "salut");
    }

    #[test]
    fn generator_is_object_safe() {
        let generator: Box<dyn TextGenerator> =
            Box::new(ApiGenerator::from_config(&make_config(None)));
        drop(generator);
    }

    #[test]
    fn error_messages_are_readable() {
        assert_eq!(GenerationError::Status(502).to_string(), "generation service responded with status 502");
        assert_eq!(GenerationError::Timeout.to_string(), "generation request timed out");
    }
}

//! Completion capability abstraction
//!
//! The generation agents treat the LLM as an opaque `complete(prompt) -> text`
//! capability. `ChatCompleter` speaks to any OpenAI-compatible
//! chat-completions endpoint; `MockCompleter` replays scripted responses for
//! tests.

use crate::config::CompletionConfig;
use crate::errors::{AppError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Trait for text completion
#[async_trait]
pub trait Completer: Send + Sync {
    /// Complete a prompt, returning the raw model output
    async fn complete(&self, prompt: &str) -> Result<String>;

    /// Get the model name
    fn model_name(&self) -> &str;
}

/// Chat-completions client for OpenAI-compatible endpoints
pub struct ChatCompleter {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
    temperature: f32,
    max_tokens: usize,
}

#[derive(Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: usize,
    temperature: f32,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessageResponse,
}

#[derive(Deserialize)]
struct ChatMessageResponse {
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

/// System prompt sent with every completion call
const SYSTEM_PROMPT: &str =
    "You are a precise educational content generator. You respond only with \
     the requested JSON, with no surrounding commentary.";

impl ChatCompleter {
    /// Create a new completer from configuration
    pub fn new(config: &CompletionConfig, api_key: String) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AppError::Configuration {
                message: format!("Failed to create HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            api_key,
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        })
    }
}

#[async_trait]
impl Completer for ChatCompleter {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: prompt.to_string(),
                },
            ],
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };

        metrics::counter!("quizforge_completion_requests_total").increment(1);

        let response = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::CompletionUnavailable {
                message: format!("Request failed: {}", e),
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::CompletionUnavailable {
                message: format!("API error {}: {}", status, body),
            });
        }

        let chat_response: ChatResponse =
            response
                .json()
                .await
                .map_err(|e| AppError::CompletionUnavailable {
                    message: format!("Failed to parse response: {}", e),
                })?;

        chat_response
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| AppError::CompletionUnavailable {
                message: "Empty response".to_string(),
            })
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

/// Scripted completer for tests.
///
/// Replays queued responses in order; an exhausted script surfaces
/// `CompletionUnavailable`, which mimics a dead capability.
#[derive(Default)]
pub struct MockCompleter {
    responses: Mutex<VecDeque<String>>,
}

impl MockCompleter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a completer preloaded with responses, replayed in order
    pub fn with_responses<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            responses: Mutex::new(responses.into_iter().map(Into::into).collect()),
        }
    }

    /// Queue an additional response
    pub fn push_response(&self, response: impl Into<String>) {
        self.responses
            .lock()
            .expect("mock completer lock poisoned")
            .push_back(response.into());
    }
}

#[async_trait]
impl Completer for MockCompleter {
    async fn complete(&self, _prompt: &str) -> Result<String> {
        self.responses
            .lock()
            .expect("mock completer lock poisoned")
            .pop_front()
            .ok_or_else(|| AppError::CompletionUnavailable {
                message: "Mock completer script exhausted".to_string(),
            })
    }

    fn model_name(&self) -> &str {
        "mock-completion"
    }
}

/// Create a completer based on configuration
pub fn create_completer(config: &CompletionConfig) -> Result<Arc<dyn Completer>> {
    match config.provider.as_str() {
        "openai" => {
            let key = config
                .api_key
                .clone()
                .ok_or_else(|| AppError::Configuration {
                    message: "completion.api_key is required for the openai provider".to_string(),
                })?;
            Ok(Arc::new(ChatCompleter::new(config, key)?))
        }
        "mock" => Ok(Arc::new(MockCompleter::new())),
        other => Err(AppError::Configuration {
            message: format!("Unknown completion provider: {}", other),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_replays_in_order() {
        let completer = MockCompleter::with_responses(["first", "second"]);
        assert_eq!(completer.complete("p").await.unwrap(), "first");
        assert_eq!(completer.complete("p").await.unwrap(), "second");
    }

    #[tokio::test]
    async fn test_mock_exhaustion_is_unavailable() {
        let completer = MockCompleter::new();
        let err = completer.complete("p").await.unwrap_err();
        assert!(matches!(err, AppError::CompletionUnavailable { .. }));
    }
}

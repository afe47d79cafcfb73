//! Text-generation capability — the opaque collaborator behind every node.
//!
//! The supervisor, the specialists, and the architect all reach the model
//! through the same seam: `TextGenerator`. The production implementation
//! calls an Anthropic-compatible Messages API over HTTP; tests substitute a
//! scripted mock.

use async_trait::async_trait;
use serde::Deserialize;

use crate::workflow::error::WorkflowError;
use crate::workflow::state::ConversationState;

/// Bounded retry count for transient generation failures. Retries reuse the
/// same input; rejected output is never appended to conversation state.
pub const GENERATION_ATTEMPTS: usize = 3;

/// How a single generation call failed.
#[derive(Debug, Clone, thiserror::Error)]
pub enum GenerationFailure {
    /// Worth retrying with the same input: timeout, connection reset,
    /// throttling, or a malformed response body.
    #[error("transient generation failure: {0}")]
    Transient(String),

    /// Retrying cannot help: rejected request, auth failure, empty output.
    #[error("generation failed: {0}")]
    Permanent(String),
}

/// The opaque text-generation capability.
///
/// `system_instruction` carries the node-specific framing; `context` is the
/// full conversation so far. Implementations must not mutate shared state.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(
        &self,
        system_instruction: &str,
        context: &ConversationState,
    ) -> Result<String, GenerationFailure>;
}

/// Call the generator with bounded retries on transient failure.
///
/// Exhaustion and permanent failures both surface as `Generation`; callers
/// that need a different terminal error (the supervisor's routing contract)
/// run their own loop.
pub async fn generate_with_retry(
    generator: &dyn TextGenerator,
    system_instruction: &str,
    context: &ConversationState,
) -> Result<String, WorkflowError> {
    let mut last_failure = String::new();
    for attempt in 1..=GENERATION_ATTEMPTS {
        match generator.generate(system_instruction, context).await {
            Ok(text) => return Ok(text),
            Err(GenerationFailure::Transient(msg)) => {
                tracing::warn!(
                    "generation attempt {}/{} failed transiently: {}",
                    attempt,
                    GENERATION_ATTEMPTS,
                    msg
                );
                last_failure = msg;
            }
            Err(GenerationFailure::Permanent(msg)) => {
                return Err(WorkflowError::Generation(msg));
            }
        }
    }
    Err(WorkflowError::Generation(format!(
        "gave up after {} attempts: {}",
        GENERATION_ATTEMPTS, last_failure
    )))
}

// ---------------------------------------------------------------------------
// HTTP implementation (Anthropic-compatible Messages API)
// ---------------------------------------------------------------------------

/// Configuration for the HTTP generator.
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// API base URL
    pub base_url: String,
    /// API key / auth token
    pub api_key: String,
    /// Model ID
    pub model: String,
    pub max_tokens: u32,
}

impl GeneratorConfig {
    /// Resolve the configuration from the environment. A missing API key is
    /// not an error here; it surfaces when the first call is made.
    pub fn from_env() -> Self {
        Self {
            base_url: std::env::var("ANTHROPIC_BASE_URL")
                .unwrap_or_else(|_| "https://api.anthropic.com".to_string()),
            api_key: std::env::var("ANTHROPIC_AUTH_TOKEN")
                .or_else(|_| std::env::var("ANTHROPIC_API_KEY"))
                .unwrap_or_default(),
            model: std::env::var("ANTHROPIC_MODEL")
                .unwrap_or_else(|_| "claude-3-5-haiku-latest".to_string()),
            max_tokens: 8192,
        }
    }
}

/// Calls an Anthropic-compatible Messages API.
///
/// POST {base_url}/v1/messages
/// Headers:
///   x-api-key: {api_key}
///   anthropic-version: 2023-06-01
///   content-type: application/json
pub struct HttpGenerator {
    client: reqwest::Client,
    config: GeneratorConfig,
}

impl HttpGenerator {
    pub fn new(config: GeneratorConfig) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(300))
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
            config,
        }
    }

    pub fn from_env() -> Self {
        Self::new(GeneratorConfig::from_env())
    }
}

#[derive(Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: String,
}

#[async_trait]
impl TextGenerator for HttpGenerator {
    async fn generate(
        &self,
        system_instruction: &str,
        context: &ConversationState,
    ) -> Result<String, GenerationFailure> {
        if self.config.api_key.is_empty() {
            return Err(GenerationFailure::Permanent(
                "No API key found. Set ANTHROPIC_AUTH_TOKEN or ANTHROPIC_API_KEY.".to_string(),
            ));
        }

        let url = format!("{}/v1/messages", self.config.base_url.trim_end_matches('/'));

        // The full history is rendered as a single user turn; the node's
        // framing goes in the system field.
        let body = serde_json::json!({
            "model": self.config.model,
            "max_tokens": self.config.max_tokens,
            "system": system_instruction,
            "messages": [
                {
                    "role": "user",
                    "content": context.transcript()
                }
            ]
        });

        tracing::debug!("calling messages API: {} (model: {})", url, self.config.model);

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() || e.is_connect() {
                    GenerationFailure::Transient(format!("HTTP request failed: {}", e))
                } else {
                    GenerationFailure::Permanent(format!("HTTP request failed: {}", e))
                }
            })?;

        let status = response.status();
        let response_text = response
            .text()
            .await
            .map_err(|e| GenerationFailure::Transient(format!("Failed to read body: {}", e)))?;

        if !status.is_success() {
            let msg = format!("API returned {}: {}", status, response_text);
            return if status.is_server_error()
                || status == reqwest::StatusCode::REQUEST_TIMEOUT
                || status == reqwest::StatusCode::TOO_MANY_REQUESTS
            {
                Err(GenerationFailure::Transient(msg))
            } else {
                Err(GenerationFailure::Permanent(msg))
            };
        }

        let parsed: MessagesResponse = serde_json::from_str(&response_text).map_err(|e| {
            GenerationFailure::Transient(format!("Failed to parse response JSON: {}", e))
        })?;

        let content = parsed
            .content
            .iter()
            .filter(|block| block.kind == "text")
            .map(|block| block.text.as_str())
            .collect::<Vec<_>>()
            .join("\n");

        if content.is_empty() {
            return Err(GenerationFailure::Permanent(
                "model returned no text content".to_string(),
            ));
        }

        Ok(content)
    }
}


#[cfg(test)]
mod tests {
    use super::testing::ScriptedGenerator;
    use super::*;
    use crate::workflow::state::Message;

    #[tokio::test]
    async fn test_retry_recovers_from_transient_failures() {
        let generator = ScriptedGenerator::new(vec![
            Err(GenerationFailure::Transient("timeout".into())),
            Err(GenerationFailure::Transient("timeout".into())),
            Ok("recovered".to_string()),
        ]);
        let context = ConversationState::new(Message::user("hi"));

        let out = generate_with_retry(&generator, "instruction", &context)
            .await
            .unwrap();
        assert_eq!(out, "recovered");
        assert_eq!(generator.call_count(), 3);
    }

    #[tokio::test]
    async fn test_retry_exhaustion_is_a_generation_error() {
        let generator = ScriptedGenerator::new(vec![
            Err(GenerationFailure::Transient("timeout".into())),
            Err(GenerationFailure::Transient("timeout".into())),
            Err(GenerationFailure::Transient("timeout".into())),
        ]);
        let context = ConversationState::new(Message::user("hi"));

        let err = generate_with_retry(&generator, "instruction", &context)
            .await
            .unwrap_err();
        assert!(matches!(err, WorkflowError::Generation(_)));
        assert_eq!(generator.call_count(), GENERATION_ATTEMPTS);
    }

    #[tokio::test]
    async fn test_permanent_failure_short_circuits() {
        let generator = ScriptedGenerator::new(vec![Err(GenerationFailure::Permanent(
            "invalid api key".into(),
        ))]);
        let context = ConversationState::new(Message::user("hi"));

        let err = generate_with_retry(&generator, "instruction", &context)
            .await
            .unwrap_err();
        assert!(matches!(err, WorkflowError::Generation(_)));
        assert_eq!(generator.call_count(), 1);
    }
}

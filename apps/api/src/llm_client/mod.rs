//! LLM client — the single point of entry for all chat-completion calls.
//!
//! ARCHITECTURAL RULE: no other module may call the Groq API directly.
//! All LLM interactions MUST go through this module.
//!
//! Model: gemma2-9b-it (hardcoded — do not make configurable to prevent drift)

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

const GROQ_API_URL: &str = "https://api.groq.com/openai/v1/chat/completions";
/// The model used for all LLM calls.
/// This is intentionally hardcoded to prevent accidental drift.
pub const MODEL: &str = "gemma2-9b-it";
const MAX_TOKENS: u32 = 1024;
const MAX_RETRIES: u32 = 3;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Rate limited after {retries} retries")]
    RateLimited { retries: u32 },

    #[error("LLM returned empty content")]
    EmptyContent,
}

/// One message in a chat-completion request, OpenAI wire format.
#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub role: &'static str,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user",
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant",
            content: content.into(),
        }
    }

    fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system",
            content: content.into(),
        }
    }
}

/// Seam for the completion model so the chat pipeline is testable with
/// scripted fakes. Carried in `AppState` as `Arc<dyn ChatModel>`.
///
/// `messages` is the ordered conversation (history plus the current input);
/// `system` is prepended as the system instruction.
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn complete(&self, system: &str, messages: &[ChatMessage])
        -> Result<String, LlmError>;
}

#[derive(Debug, Serialize)]
struct GroqRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<ChatMessage>,
}

#[derive(Debug, Deserialize)]
struct GroqResponse {
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct GroqError {
    error: GroqErrorBody,
}

#[derive(Debug, Deserialize)]
struct GroqErrorBody {
    message: String,
}

/// Groq chat-completions client (OpenAI-compatible endpoint, bearer auth).
/// Retries on 429 (rate limit) and 5xx errors with exponential backoff.
#[derive(Clone)]
pub struct GroqClient {
    client: Client,
    api_key: String,
}

impl GroqClient {
    pub fn new(api_key: String) -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(120))
                .build()
                .expect("Failed to build HTTP client"),
            api_key,
        }
    }
}

#[async_trait]
impl ChatModel for GroqClient {
    async fn complete(
        &self,
        system: &str,
        messages: &[ChatMessage],
    ) -> Result<String, LlmError> {
        let mut wire_messages = Vec::with_capacity(messages.len() + 1);
        wire_messages.push(ChatMessage::system(system));
        wire_messages.extend(messages.iter().cloned());

        let request_body = GroqRequest {
            model: MODEL,
            max_tokens: MAX_TOKENS,
            messages: wire_messages,
        };

        let mut last_error: Option<LlmError> = None;

        for attempt in 0..MAX_RETRIES {
            if attempt > 0 {
                // Exponential backoff: 1s, 2s, 4s
                let delay = std::time::Duration::from_millis(1000 * (1 << (attempt - 1)));
                warn!(
                    "LLM call attempt {} failed, retrying after {}ms...",
                    attempt,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            let response = self
                .client
                .post(GROQ_API_URL)
                .bearer_auth(&self.api_key)
                .json(&request_body)
                .send()
                .await;

            let response = match response {
                Ok(r) => r,
                Err(e) => {
                    last_error = Some(LlmError::Http(e));
                    continue;
                }
            };

            let status = response.status();

            if status.as_u16() == 429 || status.is_server_error() {
                let body = response.text().await.unwrap_or_default();
                warn!("LLM API returned {}: {}", status, body);
                last_error = Some(LlmError::Api {
                    status: status.as_u16(),
                    message: body,
                });
                continue;
            }

            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(LlmError::Api {
                    status: status.as_u16(),
                    message: parse_error_message(&body),
                });
            }

            let llm_response: GroqResponse = response.json().await?;

            if let Some(usage) = &llm_response.usage {
                debug!(
                    "LLM call succeeded: prompt_tokens={}, completion_tokens={}",
                    usage.prompt_tokens, usage.completion_tokens
                );
            }

            return extract_text(llm_response);
        }

        Err(last_error.unwrap_or(LlmError::RateLimited {
            retries: MAX_RETRIES,
        }))
    }
}

/// Pulls the assistant text out of the first choice.
fn extract_text(response: GroqResponse) -> Result<String, LlmError> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .filter(|text| !text.trim().is_empty())
        .ok_or(LlmError::EmptyContent)
}

/// Extracts the API error message from an OpenAI-style error body,
/// falling back to the raw body.
fn parse_error_message(body: &str) -> String {
    serde_json::from_str::<GroqError>(body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| body.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_parsing_extracts_first_choice() {
        let body = r#"{
            "choices": [
                {"message": {"role": "assistant", "content": "Start with an internship."}}
            ],
            "usage": {"prompt_tokens": 120, "completion_tokens": 8, "total_tokens": 128}
        }"#;
        let response: GroqResponse = serde_json::from_str(body).unwrap();
        let text = extract_text(response).unwrap();
        assert_eq!(text, "Start with an internship.");
    }

    #[test]
    fn test_response_without_usage_still_parses() {
        let body = r#"{"choices": [{"message": {"content": "ok"}}]}"#;
        let response: GroqResponse = serde_json::from_str(body).unwrap();
        assert_eq!(extract_text(response).unwrap(), "ok");
    }

    #[test]
    fn test_empty_choices_is_empty_content() {
        let body = r#"{"choices": []}"#;
        let response: GroqResponse = serde_json::from_str(body).unwrap();
        assert!(matches!(extract_text(response), Err(LlmError::EmptyContent)));
    }

    #[test]
    fn test_blank_content_is_empty_content() {
        let body = r#"{"choices": [{"message": {"content": "   "}}]}"#;
        let response: GroqResponse = serde_json::from_str(body).unwrap();
        assert!(matches!(extract_text(response), Err(LlmError::EmptyContent)));
    }

    #[test]
    fn test_parse_error_message_from_api_body() {
        let body = r#"{"error": {"message": "Invalid API Key", "type": "invalid_request_error"}}"#;
        assert_eq!(parse_error_message(body), "Invalid API Key");
    }

    #[test]
    fn test_parse_error_message_falls_back_to_raw_body() {
        assert_eq!(parse_error_message("<html>502</html>"), "<html>502</html>");
    }

    #[test]
    fn test_request_serializes_system_first() {
        let request = GroqRequest {
            model: MODEL,
            max_tokens: MAX_TOKENS,
            messages: vec![
                ChatMessage::system("be helpful"),
                ChatMessage::user("hello"),
            ],
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], MODEL);
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["role"], "user");
        assert_eq!(json["messages"][1]["content"], "hello");
    }
}

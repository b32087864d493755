// OpenAI-compatible chat-completions client.
//
// POSTs a two-message conversation (system + user) to
// `{api_base}/chat/completions` and returns the first choice's content.
// Works against any server speaking the same wire format.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::traits::Generator;
use crate::config::LlmConfig;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Chat-completions generator.
pub struct OpenAiGenerator {
    client: Client,
    api_base: String,
    api_key: String,
    model: String,
    temperature: f64,
    max_tokens: u32,
}

impl OpenAiGenerator {
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("Failed to build chat-completions HTTP client")?;
        Ok(Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.api_base)
    }
}

#[async_trait]
impl Generator for OpenAiGenerator {
    async fn generate(&self, system_prompt: &str, user_prompt: &str) -> Result<String> {
        if self.api_key.is_empty() {
            anyhow::bail!("LLM API key is empty");
        }

        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: user_prompt,
                },
            ],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .context("Failed to call chat-completions API")?;

        let status = response.status();
        let body = response
            .text()
            .await
            .context("Failed to read chat-completions response")?;

        if !status.is_success() {
            // Prefer the API's own error message when the body carries one
            if let Some(message) = error_message(&body) {
                anyhow::bail!("Chat-completions API returned {status}: {message}");
            }
            anyhow::bail!("Chat-completions API returned {status}: {body}");
        }

        let content = parse_completion(&body)?;
        debug!(model = self.model.as_str(), chars = content.chars().count(), "Generated reply");
        Ok(content)
    }
}

/// Extract the first choice's content from a chat-completions response body.
///
/// A body with an `error.message`, or with no choices, is an error.
pub fn parse_completion(body: &str) -> Result<String> {
    let parsed: ChatResponse =
        serde_json::from_str(body).context("Failed to parse chat-completions response")?;

    if let Some(error) = parsed.error {
        if !error.message.is_empty() {
            anyhow::bail!("Chat-completions API error: {}", error.message);
        }
    }

    parsed
        .choices
        .into_iter()
        .next()
        .map(|choice| choice.message.content)
        .context("Chat-completions response contained no choices")
}

fn error_message(body: &str) -> Option<String> {
    serde_json::from_str::<ChatResponse>(body)
        .ok()
        .and_then(|r| r.error)
        .map(|e| e.message)
        .filter(|m| !m.is_empty())
}

// --- Wire types ---

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f64,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
    #[serde(default)]
    error: Option<ApiError>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: String,
}

#[derive(Deserialize)]
struct ApiError {
    #[serde(default)]
    message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(key: &str) -> LlmConfig {
        LlmConfig {
            api_base: "http://localhost:9/v1/".to_string(),
            api_key: key.to_string(),
            model: "gpt-3.5-turbo".to_string(),
            temperature: 0.7,
            max_tokens: 500,
        }
    }

    #[test]
    fn test_endpoint_strips_trailing_slash() {
        let generator = OpenAiGenerator::new(&config("sk-test")).unwrap();
        assert_eq!(generator.endpoint(), "http://localhost:9/v1/chat/completions");
    }

    #[tokio::test]
    async fn test_empty_key_fails_before_any_request() {
        let generator = OpenAiGenerator::new(&config("")).unwrap();
        let err = generator.generate("sys", "user").await.unwrap_err();
        assert!(err.to_string().contains("API key is empty"));
    }

    #[test]
    fn test_parse_first_choice() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":"hi there"}},
                                   {"message":{"role":"assistant","content":"second"}}]}"#;
        assert_eq!(parse_completion(body).unwrap(), "hi there");
    }

    #[test]
    fn test_parse_error_message() {
        let body = r#"{"error":{"message":"quota exceeded","type":"insufficient_quota"}}"#;
        let err = parse_completion(body).unwrap_err();
        assert!(err.to_string().contains("quota exceeded"));
        assert_eq!(error_message(body).as_deref(), Some("quota exceeded"));
    }

    #[test]
    fn test_parse_empty_choices() {
        let err = parse_completion(r#"{"choices":[]}"#).unwrap_err();
        assert!(err.to_string().contains("no choices"));
    }

    #[test]
    fn test_parse_garbage() {
        assert!(parse_completion("<html>bad gateway</html>").is_err());
        assert_eq!(error_message("<html>"), None);
    }

    #[test]
    fn test_request_shape() {
        let request = ChatRequest {
            model: "m",
            messages: vec![ChatMessage {
                role: "system",
                content: "s",
            }],
            temperature: 0.5,
            max_tokens: 10,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["max_tokens"], 10);
    }
}

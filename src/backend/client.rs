//! OpenAI-compatible chat-completions client.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::BackendConfig;
use crate::error::BackendError;

use super::ChatBackend;

/// Chat client for an OpenAI-compatible completions API.
pub struct OpenAiChatClient {
    client: Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
}

/// Chat completion request format.
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

/// Chat completion response format.
#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

/// OpenAI error response format.
#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

impl OpenAiChatClient {
    /// Create a client from configuration.
    ///
    /// The API key is resolved at call time, not here: a missing credential
    /// must fail the individual call, not server startup.
    pub fn from_config(config: &BackendConfig) -> Result<Self, BackendError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| BackendError::Api(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key: config.api_key.clone(),
        })
    }

    fn resolve_api_key(&self) -> Result<String, BackendError> {
        self.api_key
            .clone()
            .or_else(|| std::env::var("OPENAI_API_KEY").ok())
            .ok_or(BackendError::MissingApiKey)
    }

    async fn request_completion(&self, system: &str, user: &str) -> Result<String, BackendError> {
        let api_key = self.resolve_api_key()?;
        let url = format!("{}/chat/completions", self.base_url);

        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
        };

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    BackendError::Timeout
                } else if e.is_connect() {
                    BackendError::Api(format!("Connection failed: {}", e))
                } else {
                    BackendError::Api(format!("Request failed: {}", e))
                }
            })?;

        let status = response.status();

        if status.is_success() {
            let result: ChatResponse = response
                .json()
                .await
                .map_err(|e| BackendError::Api(format!("Failed to parse response: {}", e)))?;

            let content = result
                .choices
                .into_iter()
                .next()
                .and_then(|c| c.message.content)
                .map(|c| c.trim().to_string())
                .unwrap_or_default();

            if content.is_empty() {
                return Err(BackendError::EmptyCompletion);
            }
            Ok(content)
        } else {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());

            // Try to parse as OpenAI error format
            if let Ok(error_response) = serde_json::from_str::<ErrorResponse>(&error_text) {
                Err(BackendError::Api(format!(
                    "API error ({}): {}",
                    status, error_response.error.message
                )))
            } else {
                Err(BackendError::Api(format!(
                    "API error ({}): {}",
                    status, error_text
                )))
            }
        }
    }
}

#[async_trait]
impl ChatBackend for OpenAiChatClient {
    async fn complete(&self, system: &str, user: &str) -> Result<String, BackendError> {
        self.request_completion(system, user).await
    }
}

/// Strip a markdown code fence the backend may emit despite instructions.
pub(crate) fn strip_code_fence(response: &str) -> &str {
    let trimmed = response.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop an optional language tag on the opening fence
    let body = match rest.find('\n') {
        Some(newline) => &rest[newline + 1..],
        None => rest,
    };
    body.strip_suffix("```").unwrap_or(body).trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_config_without_key_succeeds() {
        // Key resolution is deferred to call time
        let config = BackendConfig {
            api_key: None,
            ..BackendConfig::default()
        };
        assert!(OpenAiChatClient::from_config(&config).is_ok());
    }

    #[test]
    fn test_base_url_normalization() {
        let config = BackendConfig {
            base_url: "https://api.openai.com/v1/".to_string(),
            ..BackendConfig::default()
        };
        let client = OpenAiChatClient::from_config(&config).unwrap();
        assert!(!client.base_url.ends_with('/'));
    }

    #[test]
    fn test_resolve_api_key_prefers_config() {
        let config = BackendConfig {
            api_key: Some("from-config".to_string()),
            ..BackendConfig::default()
        };
        let client = OpenAiChatClient::from_config(&config).unwrap();
        assert_eq!(client.resolve_api_key().unwrap(), "from-config");
    }

    #[test]
    fn test_strip_code_fence() {
        assert_eq!(strip_code_fence("df['kills'].sum()"), "df['kills'].sum()");
        assert_eq!(
            strip_code_fence("```python\ndf['kills'].sum()\n```"),
            "df['kills'].sum()"
        );
        assert_eq!(strip_code_fence("```\n{\"a\": 1}\n```"), "{\"a\": 1}");
    }
}

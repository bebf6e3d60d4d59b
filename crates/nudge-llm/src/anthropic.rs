//! Anthropic (Claude) LLM provider implementation.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use nudge_core::error::{NudgeError, NudgeResult};
use nudge_core::traits::{GenerationOptions, Llm, LlmConfig, LlmResponse, TokenUsage};
use nudge_core::types::{ChatMessage, ChatRole};

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1";
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Default model: the smallest Claude tier is plenty for short check-ins.
pub const DEFAULT_ANTHROPIC_MODEL: &str = "claude-3-haiku-20240307";

/// Anthropic LLM provider.
pub struct AnthropicLlm {
    client: Client,
    config: LlmConfig,
    base_url: String,
}

#[derive(Debug, Serialize)]
struct AnthropicRequest {
    model: String,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    messages: Vec<AnthropicMessage>,
}

#[derive(Debug, Serialize, PartialEq)]
struct AnthropicMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<AnthropicContent>,
    #[serde(default)]
    usage: Option<AnthropicUsage>,
}

#[derive(Debug, Deserialize)]
struct AnthropicContent {
    #[serde(rename = "type")]
    content_type: String,
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AnthropicUsage {
    input_tokens: u32,
    output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct AnthropicError {
    error: AnthropicErrorDetail,
}

#[derive(Debug, Deserialize)]
struct AnthropicErrorDetail {
    message: String,
}

impl AnthropicLlm {
    /// Create a new Anthropic LLM provider.
    pub fn new(config: LlmConfig) -> NudgeResult<Self> {
        let api_key = config
            .api_key
            .clone()
            .or_else(|| std::env::var("ANTHROPIC_API_KEY").ok())
            .ok_or_else(|| {
                NudgeError::Configuration("Anthropic API key not found. Set ANTHROPIC_API_KEY environment variable or provide api_key in config.".to_string())
            })?;

        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            "x-api-key",
            api_key
                .parse()
                .map_err(|_| NudgeError::Configuration("Invalid API key format".to_string()))?,
        );
        headers.insert(
            "anthropic-version",
            reqwest::header::HeaderValue::from_static(ANTHROPIC_VERSION),
        );
        headers.insert(
            reqwest::header::CONTENT_TYPE,
            reqwest::header::HeaderValue::from_static("application/json"),
        );

        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| NudgeError::Configuration(format!("Failed to create HTTP client: {}", e)))?;

        let base_url = config
            .base_url
            .clone()
            .unwrap_or_else(|| ANTHROPIC_API_URL.to_string());

        let mut config = config;
        if config.model.is_empty() {
            config.model = DEFAULT_ANTHROPIC_MODEL.to_string();
        }

        Ok(Self {
            client,
            config,
            base_url,
        })
    }

    /// Split the system turns out of the conversation.
    ///
    /// Multiple system messages are joined; the API accepts one system field.
    fn split_system(messages: &[ChatMessage]) -> (Option<String>, Vec<AnthropicMessage>) {
        let system: Vec<&str> = messages
            .iter()
            .filter(|m| m.role == ChatRole::System)
            .map(|m| m.content.as_str())
            .collect();
        let system = if system.is_empty() {
            None
        } else {
            Some(system.join("\n\n"))
        };

        let conversation = messages
            .iter()
            .filter_map(|m| match m.role {
                ChatRole::System => None,
                ChatRole::User => Some(AnthropicMessage {
                    role: "user",
                    content: m.content.clone(),
                }),
                ChatRole::Assistant => Some(AnthropicMessage {
                    role: "assistant",
                    content: m.content.clone(),
                }),
            })
            .collect();

        (system, conversation)
    }
}

#[async_trait]
impl Llm for AnthropicLlm {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        options: Option<GenerationOptions>,
    ) -> NudgeResult<LlmResponse> {
        let options = options.unwrap_or_default();
        let (system, conversation) = Self::split_system(messages);
        if conversation.is_empty() {
            return Err(NudgeError::validation(
                "Anthropic requests need at least one user or assistant message",
            ));
        }

        let request = AnthropicRequest {
            model: self.config.model.clone(),
            max_tokens: options.max_tokens.unwrap_or(self.config.max_tokens),
            temperature: Some(options.temperature.unwrap_or(self.config.temperature)),
            top_p: options.top_p,
            system,
            messages: conversation,
        };

        let response = self
            .client
            .post(format!("{}/messages", self.base_url))
            .json(&request)
            .send()
            .await
            .map_err(|e| NudgeError::llm(format!("Anthropic API request failed: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| NudgeError::llm(format!("Failed to read response body: {}", e)))?;

        if !status.is_success() {
            let message = serde_json::from_str::<AnthropicError>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(NudgeError::llm(format!(
                "Anthropic API error ({}): {}",
                status, message
            )));
        }

        let response: AnthropicResponse = serde_json::from_str(&body)
            .map_err(|e| NudgeError::llm(format!("Failed to parse response: {}", e)))?;

        let content = response
            .content
            .iter()
            .find(|c| c.content_type == "text")
            .and_then(|c| c.text.clone());

        let usage = response.usage.map(|u| TokenUsage {
            prompt_tokens: u.input_tokens,
            completion_tokens: u.output_tokens,
            total_tokens: u.input_tokens + u.output_tokens,
        });

        tracing::debug!(model = %self.config.model, "Anthropic completion received");
        Ok(LlmResponse { content, usage })
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_system() {
        let messages = vec![
            ChatMessage::system("You are a friend."),
            ChatMessage::user("hi"),
            ChatMessage::assistant("hello!"),
            ChatMessage::system("Keep it short."),
        ];
        let (system, conversation) = AnthropicLlm::split_system(&messages);
        assert_eq!(system.as_deref(), Some("You are a friend.\n\nKeep it short."));
        assert_eq!(
            conversation,
            vec![
                AnthropicMessage {
                    role: "user",
                    content: "hi".to_string()
                },
                AnthropicMessage {
                    role: "assistant",
                    content: "hello!".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_no_system() {
        let (system, conversation) = AnthropicLlm::split_system(&[ChatMessage::user("hey")]);
        assert!(system.is_none());
        assert_eq!(conversation.len(), 1);
    }

    #[test]
    fn test_response_parsing() {
        let body = r#"{"content":[{"type":"text","text":"Morning!"}],"usage":{"input_tokens":12,"output_tokens":3}}"#;
        let parsed: AnthropicResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.content[0].text.as_deref(), Some("Morning!"));
        assert_eq!(parsed.usage.unwrap().output_tokens, 3);
    }

    #[tokio::test]
    async fn test_system_only_request_is_rejected_locally() {
        let llm = AnthropicLlm::new(LlmConfig {
            api_key: Some("test-key".to_string()),
            base_url: Some("http://127.0.0.1:9".to_string()),
            ..Default::default()
        })
        .unwrap();
        let err = llm
            .complete(&[ChatMessage::system("persona only")], None)
            .await
            .unwrap_err();
        assert!(matches!(err, NudgeError::Validation { .. }));
    }

    #[test]
    fn test_default_model() {
        let llm = AnthropicLlm::new(LlmConfig {
            api_key: Some("test-key".to_string()),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(llm.model_name(), DEFAULT_ANTHROPIC_MODEL);
        assert_eq!(llm.base_url, ANTHROPIC_API_URL);
    }
}

//! OpenAI LLM provider implementation.

use async_trait::async_trait;

use nudge_core::error::{NudgeError, NudgeResult};
use nudge_core::traits::{GenerationOptions, Llm, LlmConfig, LlmResponse};
use nudge_core::types::ChatMessage;

#[cfg(feature = "openai")]
use nudge_core::traits::TokenUsage;
#[cfg(feature = "openai")]
use nudge_core::types::ChatRole;

#[cfg(feature = "openai")]
use async_openai::{
    config::OpenAIConfig,
    types::{
        ChatCompletionRequestAssistantMessage, ChatCompletionRequestAssistantMessageContent,
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessage,
        ChatCompletionRequestSystemMessageContent, ChatCompletionRequestUserMessage,
        ChatCompletionRequestUserMessageContent, CreateChatCompletionRequest,
    },
    Client,
};

/// Default chat model.
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-3.5-turbo";

// Light penalties keep check-ins from repeating the same phrasing.
const PRESENCE_PENALTY: f32 = 0.1;
const FREQUENCY_PENALTY: f32 = 0.1;

/// OpenAI LLM provider.
pub struct OpenAIProvider {
    #[cfg(feature = "openai")]
    client: Client<OpenAIConfig>,
    config: LlmConfig,
}

impl OpenAIProvider {
    /// Create a new OpenAI LLM provider.
    pub fn new(config: LlmConfig) -> NudgeResult<Self> {
        let api_key = config
            .api_key
            .clone()
            .or_else(|| std::env::var("OPENAI_API_KEY").ok())
            .ok_or_else(|| {
                NudgeError::Configuration("OpenAI API key not found. Set OPENAI_API_KEY environment variable or provide api_key in config.".to_string())
            })?;

        #[cfg(feature = "openai")]
        let client = {
            let openai_config = match config.base_url {
                Some(ref base_url) => OpenAIConfig::new().with_api_key(api_key).with_api_base(base_url),
                None => OpenAIConfig::new().with_api_key(api_key),
            };
            Client::with_config(openai_config)
        };
        #[cfg(not(feature = "openai"))]
        let _ = api_key;

        let mut config = config;
        if config.model.is_empty() {
            config.model = DEFAULT_OPENAI_MODEL.to_string();
        }

        Ok(Self {
            #[cfg(feature = "openai")]
            client,
            config,
        })
    }

    #[cfg(feature = "openai")]
    fn to_openai(msg: &ChatMessage) -> ChatCompletionRequestMessage {
        match msg.role {
            ChatRole::System => ChatCompletionRequestMessage::System(ChatCompletionRequestSystemMessage {
                content: ChatCompletionRequestSystemMessageContent::Text(msg.content.clone()),
                name: None,
            }),
            ChatRole::User => ChatCompletionRequestMessage::User(ChatCompletionRequestUserMessage {
                content: ChatCompletionRequestUserMessageContent::Text(msg.content.clone()),
                name: None,
            }),
            ChatRole::Assistant => {
                ChatCompletionRequestMessage::Assistant(ChatCompletionRequestAssistantMessage {
                    content: Some(ChatCompletionRequestAssistantMessageContent::Text(
                        msg.content.clone(),
                    )),
                    ..Default::default()
                })
            }
        }
    }
}

#[async_trait]
impl Llm for OpenAIProvider {
    #[cfg(feature = "openai")]
    async fn complete(
        &self,
        messages: &[ChatMessage],
        options: Option<GenerationOptions>,
    ) -> NudgeResult<LlmResponse> {
        let options = options.unwrap_or_default();

        let request = CreateChatCompletionRequest {
            model: self.config.model.clone(),
            messages: messages.iter().map(Self::to_openai).collect(),
            temperature: Some(options.temperature.unwrap_or(self.config.temperature)),
            top_p: Some(options.top_p.unwrap_or(self.config.top_p)),
            max_tokens: Some(options.max_tokens.unwrap_or(self.config.max_tokens)),
            presence_penalty: Some(PRESENCE_PENALTY),
            frequency_penalty: Some(FREQUENCY_PENALTY),
            ..Default::default()
        };

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| NudgeError::llm(format!("OpenAI API error: {}", e)))?;

        let choice = response
            .choices
            .first()
            .ok_or_else(|| NudgeError::llm("No response choices returned"))?;

        let usage = response.usage.map(|u| TokenUsage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
            total_tokens: u.total_tokens,
        });

        tracing::debug!(model = %self.config.model, "OpenAI completion received");
        Ok(LlmResponse {
            content: choice.message.content.clone(),
            usage,
        })
    }

    #[cfg(not(feature = "openai"))]
    async fn complete(
        &self,
        _messages: &[ChatMessage],
        _options: Option<GenerationOptions>,
    ) -> NudgeResult<LlmResponse> {
        Err(NudgeError::Configuration(
            "OpenAI feature not enabled. Enable the 'openai' feature.".to_string(),
        ))
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_model_and_explicit_key() {
        let provider = OpenAIProvider::new(LlmConfig {
            api_key: Some("sk-test".to_string()),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(provider.model_name(), DEFAULT_OPENAI_MODEL);
    }

    #[cfg(feature = "openai")]
    #[test]
    fn test_role_mapping() {
        assert!(matches!(
            OpenAIProvider::to_openai(&ChatMessage::system("persona")),
            ChatCompletionRequestMessage::System(_)
        ));
        assert!(matches!(
            OpenAIProvider::to_openai(&ChatMessage::assistant("hi")),
            ChatCompletionRequestMessage::Assistant(_)
        ));
    }
}

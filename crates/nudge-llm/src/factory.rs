//! Factory for creating LLM providers.

use std::sync::Arc;

use nudge_core::config::{LlmProvider, LlmProviderConfig};
use nudge_core::error::NudgeResult;
use nudge_core::traits::{Llm, LlmConfig};

use crate::anthropic::AnthropicLlm;
use crate::openai::OpenAIProvider;

/// Factory for creating LLM providers.
pub struct LlmFactory;

impl LlmFactory {
    /// Create an LLM provider from the given configuration.
    pub fn create(provider: LlmProvider, config: LlmConfig) -> NudgeResult<Arc<dyn Llm>> {
        let llm: Arc<dyn Llm> = match provider {
            LlmProvider::OpenAI => Arc::new(OpenAIProvider::new(config)?),
            LlmProvider::Anthropic => Arc::new(AnthropicLlm::new(config)?),
        };
        tracing::info!(?provider, model = llm.model_name(), "LLM provider ready");
        Ok(llm)
    }

    /// Create a provider from engine configuration.
    pub fn from_config(config: &LlmProviderConfig) -> NudgeResult<Arc<dyn Llm>> {
        Self::create(config.provider, config.config.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_config_uses_provider_default_model() {
        let mut config = LlmProviderConfig::new(LlmProvider::Anthropic);
        config.config.api_key = Some("test-key".to_string());
        let llm = LlmFactory::from_config(&config).unwrap();
        assert_eq!(llm.model_name(), "claude-3-haiku-20240307");
    }

    #[test]
    fn test_explicit_model_is_kept() {
        let mut config = LlmProviderConfig::new(LlmProvider::OpenAI);
        config.config.api_key = Some("sk-test".to_string());
        config.config.model = "gpt-4o-mini".to_string();
        let llm = LlmFactory::from_config(&config).unwrap();
        assert_eq!(llm.model_name(), "gpt-4o-mini");
    }
}

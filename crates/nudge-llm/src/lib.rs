//! nudge-llm - Completion providers for nudge.
//!
//! The engine only needs `Llm::complete`; this crate supplies the hosted
//! backends behind it. When no provider is configured the engine composes
//! every message from its local fallback pools instead.
//!
//! # Supported Providers
//!
//! - **OpenAI** (feature: `openai`) - GPT-3.5, GPT-4o, etc.
//! - **Anthropic** - Claude 3 family over the Messages API
//!
//! # Example
//!
//! ```ignore
//! use nudge_core::traits::LlmConfig;
//! use nudge_llm::{LlmFactory, LlmProvider};
//!
//! let llm = LlmFactory::create(LlmProvider::OpenAI, LlmConfig::default())?;
//! let llm = LlmFactory::from_config(&config.llm.unwrap())?;
//! ```

mod anthropic;
mod factory;
mod openai;

pub use anthropic::{AnthropicLlm, DEFAULT_ANTHROPIC_MODEL};
pub use factory::LlmFactory;
pub use openai::{OpenAIProvider, DEFAULT_OPENAI_MODEL};

// Re-export core types for convenience
pub use nudge_core::config::{LlmProvider, LlmProviderConfig};
pub use nudge_core::traits::{GenerationOptions, Llm, LlmConfig, LlmResponse};

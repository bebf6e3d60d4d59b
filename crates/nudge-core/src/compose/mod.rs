//! Response composition: remote completion with a local fallback.

mod fallback;
mod prompt;

pub use fallback::{detect_topic, FallbackResponder, Topic};
pub use prompt::{build_messages, system_prompt, PROMPT_TRANSCRIPT_LINES};

use std::sync::Arc;
use std::time::Duration;

use chrono_tz::Tz;
use tracing::{debug, warn};

use crate::context::AssembledContext;
use crate::error::NudgeError;
use crate::mode::ModeSelector;
use crate::traits::Llm;
use crate::triggers::TriggerEvent;

/// Default bound on a single completion request.
pub const DEFAULT_COMPLETION_TIMEOUT: Duration = Duration::from_secs(8);

/// Name used when neither the profile nor the config supplies one.
pub const DEFAULT_USER_NAME: &str = "friend";

/// What the composer is responding to.
#[derive(Debug, Clone)]
pub enum ComposeInput {
    /// A proactive trigger firing.
    Trigger(TriggerEvent),
    /// Inbound text from the user.
    Reply(String),
}

/// Where a composed text came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComposeSource {
    Llm,
    Fallback,
}

/// Composed text plus its origin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Composed {
    pub text: String,
    pub source: ComposeSource,
}

/// Turns an input and context into message text.
pub struct ResponseComposer {
    llm: Option<Arc<dyn Llm>>,
    fallback: FallbackResponder,
    modes: Arc<ModeSelector>,
    timeout: Duration,
    user_name: String,
    timezone: Tz,
}

impl ResponseComposer {
    pub fn new(llm: Option<Arc<dyn Llm>>, modes: Arc<ModeSelector>) -> Self {
        Self {
            llm,
            fallback: FallbackResponder::new(),
            modes,
            timeout: DEFAULT_COMPLETION_TIMEOUT,
            user_name: DEFAULT_USER_NAME.to_string(),
            timezone: chrono_tz::UTC,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_fallback(mut self, fallback: FallbackResponder) -> Self {
        self.fallback = fallback;
        self
    }

    /// Name used in the persona when the profile has none.
    pub fn with_user_name(mut self, name: impl Into<String>) -> Self {
        self.user_name = name.into();
        self
    }

    pub fn with_timezone(mut self, tz: Tz) -> Self {
        self.timezone = tz;
        self
    }

    pub fn has_llm(&self) -> bool {
        self.llm.is_some()
    }

    /// Compose text for `input`. Always returns non-empty text.
    pub async fn compose(&self, input: &ComposeInput, context: &AssembledContext) -> String {
        self.compose_detailed(input, context).await.text
    }

    /// Like [`compose`](Self::compose) but reports whether the fallback was used.
    pub async fn compose_detailed(&self, input: &ComposeInput, context: &AssembledContext) -> Composed {
        if let Some(llm) = &self.llm {
            match self.complete(llm.as_ref(), input, context).await {
                Ok(text) => {
                    return Composed {
                        text,
                        source: ComposeSource::Llm,
                    }
                }
                Err(e) => {
                    warn!(model = llm.model_name(), error = %e, "Completion failed, using fallback");
                }
            }
        }

        let text = match input {
            ComposeInput::Trigger(event) => self.fallback.proactive(event, context),
            ComposeInput::Reply(text) => self.fallback.reactive(text),
        };
        Composed {
            text,
            source: ComposeSource::Fallback,
        }
    }

    async fn complete(
        &self,
        llm: &dyn Llm,
        input: &ComposeInput,
        context: &AssembledContext,
    ) -> Result<String, NudgeError> {
        let name = context.user_name().unwrap_or(&self.user_name);
        let messages = build_messages(name, self.modes.current(), context, input, self.timezone);

        let response = tokio::time::timeout(self.timeout, llm.complete(&messages, None))
            .await
            .map_err(|_| NudgeError::timeout("completion", self.timeout))??;

        let text = response.content_or_empty().trim();
        if text.is_empty() {
            return Err(NudgeError::Llm {
                message: "empty completion".to_string(),
                code: crate::error::ErrorCode::LlmEmptyResponse,
                source: None,
            });
        }
        debug!(model = llm.model_name(), chars = text.len(), "Completion succeeded");
        Ok(text.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::NudgeResult;
    use crate::traits::{GenerationOptions, LlmResponse};
    use crate::triggers::TriggerCategory;
    use crate::types::ChatMessage;
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::Mutex;

    struct ScriptedLlm {
        reply: NudgeResult<&'static str>,
        seen: Mutex<Vec<ChatMessage>>,
    }

    #[async_trait]
    impl Llm for ScriptedLlm {
        async fn complete(
            &self,
            messages: &[ChatMessage],
            _options: Option<GenerationOptions>,
        ) -> NudgeResult<LlmResponse> {
            self.seen.lock().unwrap().extend_from_slice(messages);
            match &self.reply {
                Ok(text) => Ok(LlmResponse::text(*text)),
                Err(_) => Err(NudgeError::llm("boom")),
            }
        }

        fn model_name(&self) -> &str {
            "scripted"
        }
    }

    fn composer(reply: NudgeResult<&'static str>) -> (ResponseComposer, Arc<ScriptedLlm>) {
        let llm = Arc::new(ScriptedLlm {
            reply,
            seen: Mutex::new(Vec::new()),
        });
        let composer = ResponseComposer::new(Some(llm.clone()), Arc::new(ModeSelector::default()))
            .with_fallback(FallbackResponder::with_seed(3));
        (composer, llm)
    }

    #[tokio::test]
    async fn test_llm_text_is_trimmed() {
        let (composer, llm) = composer(Ok("  Morning, Sam!  \n"));
        let ctx = AssembledContext::empty(Utc::now());
        let input = ComposeInput::Trigger(TriggerEvent::new(TriggerCategory::Morning, ctx.assembled_at));
        let out = composer.compose_detailed(&input, &ctx).await;
        assert_eq!(out.text, "Morning, Sam!");
        assert_eq!(out.source, ComposeSource::Llm);
        assert!(llm.seen.lock().unwrap()[0].content.contains("companion for friend"));
    }

    #[tokio::test]
    async fn test_empty_completion_falls_back() {
        let (composer, _) = composer(Ok("   "));
        let ctx = AssembledContext::empty(Utc::now());
        let out = composer
            .compose_detailed(&ComposeInput::Reply("my goal is to swim".into()), &ctx)
            .await;
        assert_eq!(out.source, ComposeSource::Fallback);
        assert!(out.text.contains("goals"));
    }

    #[tokio::test]
    async fn test_error_falls_back() {
        let (composer, _) = composer(Err(NudgeError::llm("down")));
        let ctx = AssembledContext::empty(Utc::now());
        let text = composer.compose(&ComposeInput::Reply("hello".into()), &ctx).await;
        assert!(!text.is_empty());
    }

    #[tokio::test]
    async fn test_no_llm_uses_fallback() {
        let composer = ResponseComposer::new(None, Arc::new(ModeSelector::default()));
        assert!(!composer.has_llm());
        let ctx = AssembledContext::empty(Utc::now());
        let event = TriggerEvent::new(TriggerCategory::Weekly, ctx.assembled_at);
        let text = composer.compose(&ComposeInput::Trigger(event), &ctx).await;
        assert!(text.starts_with("🗓️ Week's almost over!"));
    }
}

//! Fakes shared by the integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use nudge_core::{
    ChatMessage, Engine, FallbackResponder, GenerationOptions, Llm, LlmResponse, NudgeError,
    NudgeResult, SqliteContextStore, TokioClock, Transport,
};

/// Transport that records every send and can be told to fail.
#[derive(Default)]
pub struct RecordingTransport {
    sent: Mutex<Vec<String>>,
    fail: AtomicBool,
}

impl RecordingTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn sent(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn send(&self, text: &str) -> NudgeResult<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(NudgeError::transport("offline"));
        }
        self.sent.lock().unwrap().push(text.to_string());
        Ok(())
    }

    fn name(&self) -> &str {
        "recording"
    }
}

/// LLM that always errors.
pub struct FailingLlm;

#[async_trait]
impl Llm for FailingLlm {
    async fn complete(
        &self,
        _messages: &[ChatMessage],
        _options: Option<GenerationOptions>,
    ) -> NudgeResult<LlmResponse> {
        Err(NudgeError::llm("provider unavailable"))
    }

    fn model_name(&self) -> &str {
        "failing"
    }
}

/// LLM that never answers within any reasonable bound.
pub struct HangingLlm;

#[async_trait]
impl Llm for HangingLlm {
    async fn complete(
        &self,
        _messages: &[ChatMessage],
        _options: Option<GenerationOptions>,
    ) -> NudgeResult<LlmResponse> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok(LlmResponse::text("too late"))
    }

    fn model_name(&self) -> &str {
        "hanging"
    }
}

/// LLM that returns a fixed reply.
pub struct EchoLlm(pub &'static str);

#[async_trait]
impl Llm for EchoLlm {
    async fn complete(
        &self,
        _messages: &[ChatMessage],
        _options: Option<GenerationOptions>,
    ) -> NudgeResult<LlmResponse> {
        Ok(LlmResponse::text(self.0))
    }

    fn model_name(&self) -> &str {
        "echo"
    }
}

/// Monday 2024-03-04 10:00 UTC.
pub fn monday_morning() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 4, 10, 0, 0).unwrap()
}

pub struct Harness {
    pub store: Arc<SqliteContextStore>,
    pub transport: Arc<RecordingTransport>,
    pub engine: Arc<Engine>,
}

/// Engine over an in-memory store, a recording transport and a paused-time
/// clock anchored at `anchor`.
pub fn harness(anchor: DateTime<Utc>, llm: Option<Arc<dyn Llm>>) -> Harness {
    let store = Arc::new(SqliteContextStore::in_memory().unwrap());
    let transport = RecordingTransport::new();
    let engine = Engine::builder(store.clone(), transport.clone())
        .maybe_llm(llm)
        .clock(Arc::new(TokioClock::starting_at(anchor)))
        .fallback(FallbackResponder::with_seed(11))
        .completion_timeout(Duration::from_millis(200))
        .build();
    Harness {
        store,
        transport,
        engine: Arc::new(engine),
    }
}

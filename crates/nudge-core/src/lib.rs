//! nudge-core - Core library for nudge.
//!
//! This crate provides the proactive engagement engine for a personal
//! check-in assistant: trigger scheduling with silence escalation, context
//! assembly over a conversation store, personality modes, and response
//! composition with a local fallback.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use nudge_core::{Engine, EngineConfig, SqliteContextStore, TriggerCategory, TriggerScheduler};
//!
//! let config = EngineConfig::from_env()?;
//! config.validate()?;
//!
//! let store = Arc::new(SqliteContextStore::new(&config.db_path)?);
//! let engine = Arc::new(
//!     Engine::builder(store, transport)
//!         .timezone(config.tz()?)
//!         .mode(config.initial_mode()?)
//!         .build(),
//! );
//!
//! let scheduler = TriggerScheduler::configure(engine.clone(), &config.triggers)?;
//! scheduler.start().await;
//! scheduler.trigger_now(TriggerCategory::Morning).await?;
//! scheduler.stop().await;
//! ```

pub mod clock;
pub mod compose;
pub mod config;
pub mod context;
pub mod engine;
pub mod error;
pub mod mode;
pub mod scheduler;
pub mod store;
pub mod traits;
pub mod triggers;
pub mod types;

// Re-export commonly used types
pub use clock::{Clock, SystemClock, TokioClock};
pub use compose::{ComposeInput, FallbackResponder, ResponseComposer};
pub use config::{EngineConfig, LlmProvider, LlmProviderConfig};
pub use context::{AssembledContext, ContextAssembler};
pub use engine::{Engine, EngineBuilder, SkipReason, TriggerOutcome};
pub use error::{ErrorCode, NudgeError, NudgeResult};
pub use mode::{Mode, ModeSelector};
pub use scheduler::{SchedulerStatus, TriggerScheduler, TriggerStatus};
pub use store::{SqliteContextStore, StoreStats};
pub use traits::{ContextStore, GenerationOptions, Llm, LlmConfig, LlmResponse, Transport};
pub use triggers::{Cadence, SilenceBand, TriggerCategory, TriggerDefinition, TriggerEvent};
pub use types::{
    ChatMessage, ChatRole, Goal, GoalPriority, GoalStatus, Message, MessageKind, NewGoal,
    Preferences, Sender, UserProfile,
};

//! Builds the engine stack from configuration.

use std::sync::Arc;

use nudge_core::config::EngineConfig;
use nudge_core::error::NudgeResult;
use nudge_core::traits::{Llm, Transport};
use nudge_core::{Engine, SqliteContextStore, TriggerScheduler};
use nudge_llm::LlmFactory;
use tracing::info;

use crate::state::AppState;

/// Create the application state: store, engine and a configured (not yet
/// started) scheduler.
pub fn create_state(config: &EngineConfig, transport: Arc<dyn Transport>) -> NudgeResult<AppState> {
    config.validate()?;

    let store = Arc::new(SqliteContextStore::new(&config.db_path)?);
    info!(path = %config.db_path.display(), "Context store opened");

    let llm = create_llm(config)?;
    let scheduler = create_scheduler(config, store.clone(), transport, llm)?;
    Ok(AppState::new(store, scheduler))
}

/// Create the scheduler over an existing store.
pub fn create_scheduler(
    config: &EngineConfig,
    store: Arc<SqliteContextStore>,
    transport: Arc<dyn Transport>,
    llm: Option<Arc<dyn Llm>>,
) -> NudgeResult<Arc<TriggerScheduler>> {
    let engine = Engine::builder(store, transport)
        .maybe_llm(llm)
        .timezone(config.tz()?)
        .mode(config.initial_mode()?)
        .max_history(config.max_history)
        .completion_timeout(config.completion_timeout())
        .user_name(config.user_name.clone())
        .build();

    let scheduler = TriggerScheduler::configure(Arc::new(engine), &config.triggers)?;
    Ok(Arc::new(scheduler))
}

fn create_llm(config: &EngineConfig) -> NudgeResult<Option<Arc<dyn Llm>>> {
    match config.llm {
        Some(ref llm) => LlmFactory::from_config(llm).map(Some),
        None => {
            info!("No LLM provider configured; using local fallback responses");
            Ok(None)
        }
    }
}

//! Server state management.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use nudge_core::{Engine, SqliteContextStore, TriggerScheduler};

/// Shared application state.
///
/// The engine and scheduler are the same instances the background triggers
/// and the console use.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<Engine>,
    pub store: Arc<SqliteContextStore>,
    pub scheduler: Arc<TriggerScheduler>,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    /// Create a new application state.
    pub fn new(store: Arc<SqliteContextStore>, scheduler: Arc<TriggerScheduler>) -> Self {
        Self {
            engine: scheduler.engine().clone(),
            store,
            scheduler,
            started_at: Utc::now(),
        }
    }
}

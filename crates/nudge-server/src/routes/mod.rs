//! Route definitions for the REST API.

mod checkin;
mod goals;
mod health;
mod messages;
mod mode;
mod profile;
mod scheduler;

use axum::{
    routing::{get, patch, post},
    Router,
};

use crate::state::AppState;

/// Create the main application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Service info and health
        .route("/", get(health::index))
        .route("/health", get(health::health_check))
        .route("/stats", get(health::stats))
        // Proactive and reactive paths
        .route("/trigger/checkin", post(checkin::trigger_checkin))
        .route("/messages", get(messages::list_messages).post(messages::post_message))
        // Personality mode
        .route("/mode", get(mode::get_mode).put(mode::set_mode))
        // Goals and profile
        .route("/goals", get(goals::list_goals).post(goals::add_goal))
        .route("/goals/:id", patch(goals::update_goal))
        .route("/profile", get(profile::get_profile).put(profile::put_profile))
        // Scheduler
        .route("/scheduler", get(scheduler::scheduler_status))
        // Attach state
        .with_state(state)
}

pub use checkin::*;
pub use goals::*;
pub use health::*;
pub use messages::*;
pub use mode::*;
pub use profile::*;
pub use scheduler::*;

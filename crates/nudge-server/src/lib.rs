//! nudge-server - REST API server for nudge.
//!
//! Hosts the engagement engine: the trigger scheduler runs in the background,
//! the console front door reads stdin, and the REST routes expose manual
//! check-ins, mode switching, goals, the profile and stats.
//!
//! # Example
//!
//! ```ignore
//! use nudge_server::{create_server, create_state, transport_from_name};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = nudge_core::EngineConfig::from_env()?;
//!     let state = create_state(&config, transport_from_name("simulation")?)?;
//!     state.scheduler.start().await;
//!
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
//!     axum::serve(listener, create_server(state)).await?;
//!     Ok(())
//! }
//! ```

pub mod console;
pub mod error;
pub mod factory;
pub mod middleware;
pub mod routes;
pub mod state;
pub mod transports;

pub use error::{ApiError, ApiResult};
pub use factory::{create_scheduler, create_state};
pub use state::AppState;
pub use transports::{transport_from_name, ConsoleTransport, SimulationTransport};

use axum::{middleware as axum_middleware, Router};
use tower_http::trace::TraceLayer;

/// Create the server with all routes and middleware.
pub fn create_server(state: AppState) -> Router {
    routes::create_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(middleware::cors_layer())
        .layer(axum_middleware::from_fn(middleware::logging_middleware))
}

/// Create the server with authentication middleware.
pub fn create_server_with_auth(state: AppState) -> Router {
    routes::create_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(middleware::cors_layer())
        .layer(axum_middleware::from_fn(middleware::auth_middleware))
        .layer(axum_middleware::from_fn(middleware::logging_middleware))
}

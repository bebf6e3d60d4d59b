//! nudge-server - REST API server binary.

use std::net::SocketAddr;

use nudge_core::EngineConfig;
use nudge_server::console::run_console;
use nudge_server::{create_server, create_server_with_auth, create_state, transport_from_name};
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

fn init_tracing() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::from_default_env()
        .add_directive(Level::INFO.into())
        .add_directive("nudge_server=debug".parse()?);

    if std::env::var("NUDGE_LOG_JSON").is_ok() {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(fmt::layer())
            .with(filter)
            .init();
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenvy::dotenv().ok();
    init_tracing()?;

    // Get configuration from environment
    let config = EngineConfig::from_env()?;
    let host = std::env::var("NUDGE_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port: u16 = std::env::var("NUDGE_PORT")
        .unwrap_or_else(|_| "8080".to_string())
        .parse()
        .map_err(|e| format!("NUDGE_PORT must be a valid port number: {}", e))?;
    let require_auth = std::env::var("NUDGE_REQUIRE_AUTH").is_ok();
    let transport_name = std::env::var("NUDGE_TRANSPORT").unwrap_or_else(|_| "console".to_string());

    // Invalid triggers, mode or timezone abort here
    let transport = transport_from_name(&transport_name)?;
    let state = create_state(&config, transport)?;

    state.scheduler.start().await;
    info!(
        user = %config.user_name,
        timezone = %config.timezone,
        mode = %state.engine.current_mode(),
        transport = %transport_name,
        "Engagement engine started"
    );

    let shutdown = CancellationToken::new();
    let console = if transport_name.eq_ignore_ascii_case("console") {
        Some(tokio::spawn(run_console(state.scheduler.clone(), shutdown.clone())))
    } else {
        None
    };

    // Create server with or without auth
    let app = if require_auth {
        info!("Authentication enabled");
        create_server_with_auth(state.clone())
    } else {
        info!("Authentication disabled");
        create_server(state.clone())
    };

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("Starting nudge-server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    // `/quit` on the console also shuts the server down
    let console_quit = shutdown.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            tokio::select! {
                _ = shutdown_signal() => {},
                _ = console_quit.cancelled() => {},
            }
            info!("Shutdown signal received, stopping scheduler...");
        })
        .await?;

    shutdown.cancel();
    state.scheduler.stop().await;
    if let Some(console) = console {
        // stdin reads are not cancellable on every platform
        console.abort();
    }

    info!("Server stopped cleanly");
    Ok(())
}

//! Interactive console front door.
//!
//! Each stdin line is an inbound message. A few slash commands drive the
//! engine directly: `/mode <name>`, `/checkin [category]` and `/quit`.

use std::sync::Arc;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use nudge_core::{Engine, TriggerCategory, TriggerOutcome, TriggerScheduler};

/// Channel tag recorded on console messages.
pub const CONSOLE_CHANNEL: &str = "console";

/// A parsed console line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    Say(String),
    Mode(String),
    Checkin(Option<String>),
    Quit,
    Empty,
}

impl ConsoleCommand {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return Self::Empty;
        }
        let Some(rest) = line.strip_prefix('/') else {
            return Self::Say(line.to_string());
        };

        let mut parts = rest.splitn(2, char::is_whitespace);
        let command = parts.next().unwrap_or_default().to_lowercase();
        let arg = parts.next().map(str::trim).filter(|a| !a.is_empty());
        match (command.as_str(), arg) {
            ("quit" | "exit", _) => Self::Quit,
            ("mode", Some(name)) => Self::Mode(name.to_string()),
            ("checkin", arg) => Self::Checkin(arg.map(str::to_string)),
            _ => Self::Say(line.to_string()),
        }
    }
}

/// Read stdin until EOF, `/quit` or cancellation.
pub async fn run_console(scheduler: Arc<TriggerScheduler>, token: CancellationToken) {
    let stdin = BufReader::new(tokio::io::stdin());
    run_console_with(stdin, scheduler, token).await;
}

async fn run_console_with<R>(reader: R, scheduler: Arc<TriggerScheduler>, token: CancellationToken)
where
    R: AsyncBufRead + Unpin,
{
    let engine = scheduler.engine().clone();
    let mut lines = reader.lines();
    info!(mode = %engine.current_mode(), "Console ready; type a message or /quit");

    loop {
        let line = tokio::select! {
            biased;
            _ = token.cancelled() => break,
            line = lines.next_line() => line,
        };

        let line = match line {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                warn!(error = %e, "Failed to read console input");
                break;
            }
        };

        match ConsoleCommand::parse(&line) {
            ConsoleCommand::Empty => continue,
            ConsoleCommand::Quit => {
                token.cancel();
                break;
            }
            ConsoleCommand::Mode(name) => report_mode(&engine, &name),
            ConsoleCommand::Checkin(category) => checkin(&scheduler, &engine, category).await,
            ConsoleCommand::Say(text) => {
                if let Err(e) = engine.handle_incoming(&text, CONSOLE_CHANNEL).await {
                    warn!(error = %e, "Failed to reply to console message");
                }
            }
        }
    }

    debug!("Console loop finished");
}

fn report_mode(engine: &Engine, name: &str) {
    match engine.set_mode(name) {
        Ok(mode) => println!("Mode set to {}", mode),
        Err(e) => println!("{}", e),
    }
}

async fn checkin(scheduler: &TriggerScheduler, engine: &Engine, category: Option<String>) {
    let outcome = match category {
        Some(name) => match TriggerCategory::parse(&name) {
            Ok(category) => scheduler.trigger_now(category).await,
            Err(e) => {
                println!("{}", e);
                return;
            }
        },
        None => engine.trigger_checkin().await,
    };

    match outcome {
        Ok(TriggerOutcome::Sent(_)) => {}
        Ok(TriggerOutcome::Skipped(reason)) => println!("Check-in skipped: {}", reason),
        Err(e) => warn!(error = %e, "Manual check-in failed"),
    }
}

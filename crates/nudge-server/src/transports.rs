//! Outbound transports.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use nudge_core::error::{NudgeError, NudgeResult};
use nudge_core::traits::Transport;

/// Prints messages to stdout.
#[derive(Debug, Default)]
pub struct ConsoleTransport;

#[async_trait]
impl Transport for ConsoleTransport {
    async fn send(&self, text: &str) -> NudgeResult<()> {
        println!("\n🤖: {}\n", text);
        Ok(())
    }

    fn name(&self) -> &str {
        "console"
    }
}

/// Logs messages without delivering them anywhere.
#[derive(Debug, Default)]
pub struct SimulationTransport;

#[async_trait]
impl Transport for SimulationTransport {
    async fn send(&self, text: &str) -> NudgeResult<()> {
        info!(chars = text.chars().count(), text, "Simulated send");
        Ok(())
    }

    fn name(&self) -> &str {
        "simulation"
    }
}

/// Resolve a transport by name (`console` or `simulation`).
pub fn transport_from_name(name: &str) -> NudgeResult<Arc<dyn Transport>> {
    match name.trim().to_lowercase().as_str() {
        "console" => Ok(Arc::new(ConsoleTransport)),
        "simulation" | "sim" => Ok(Arc::new(SimulationTransport)),
        other => Err(NudgeError::configuration(format!(
            "Unknown transport '{}'. Use 'console' or 'simulation'.",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_from_name() {
        assert_eq!(transport_from_name("Console").unwrap().name(), "console");
        assert_eq!(transport_from_name("sim").unwrap().name(), "simulation");
        assert!(transport_from_name("sms").is_err());
    }

    #[tokio::test]
    async fn test_simulation_send_succeeds() {
        tokio_test::assert_ok!(SimulationTransport.send("hello").await);
    }
}

//! Outbound messaging trait.

use async_trait::async_trait;

use crate::error::NudgeResult;

/// Delivers text to the user.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send `text` to the user. `Ok` means delivered.
    async fn send(&self, text: &str) -> NudgeResult<()>;

    /// Short name used in logs and as the message channel tag.
    fn name(&self) -> &str;
}

//! Async commands pattern for side effects.
//!
//! Commands represent async operations that run outside the main event loop.
//! Screens return commands, and the App spawns them tied to the active
//! screen's cancellation token.

use async_trait::async_trait;
use color_eyre::Result;
use tokio::sync::mpsc::UnboundedSender;

use crate::app::AppMessage;

/// Async commands that perform side effects.
///
/// Commands are spawned by the App. They report their outcome back to the
/// screen that issued them through the screen's own channel, and may use
/// `app_tx` for app-level feedback such as toasts.
#[async_trait]
pub trait Command: Send + 'static {
    /// Human-readable name for logging.
    fn name(&self) -> String;

    /// Execute the command.
    async fn execute(self: Box<Self>, app_tx: UnboundedSender<AppMessage>) -> Result<()>;
}

//! The interactive PIN seam.

use async_trait::async_trait;

/// Why the engine is asking for a PIN.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PinReason {
    /// First-time end-to-end setup: a brand new PIN is being chosen.
    Setup,
    /// Unlocking an existing encrypted remote (first attempt).
    Decrypt,
    /// A previous attempt failed tag verification; attempt index follows.
    Retry,
}

/// Asks the user for a PIN. `None` or an empty string signals
/// cancellation.
#[async_trait]
pub trait PinPrompt: Send + Sync {
    async fn ask_pin(&self, reason: PinReason, attempt: u32) -> Option<String>;
}

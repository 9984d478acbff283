//! ExitSignal - process-wide cooperative cancellation

use tokio_util::sync::CancellationToken;

/// Broadcast-on-fire shutdown signal
///
/// Cloning shares the same signal. [`ExitSignal::child`] derives a signal
/// that fires with its parent but can also be fired alone, which is how a
/// sink stops its own auxiliary tasks on `close`.
#[derive(Debug, Clone, Default)]
pub struct ExitSignal {
    token: CancellationToken,
}

impl ExitSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fire the signal. Idempotent.
    pub fn fire(&self) {
        self.token.cancel();
    }

    pub fn is_fired(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Resolves once the signal has fired
    pub async fn fired(&self) {
        self.token.cancelled().await
    }

    /// Derive a signal scoped to a sub-task
    pub fn child(&self) -> Self {
        Self {
            token: self.token.child_token(),
        }
    }
}

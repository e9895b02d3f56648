//! Cooperative cancellation for call sequences.

use std::sync::Arc;
use tokio::sync::watch;

/// Cloneable handle that aborts a call sequence from outside.
///
/// Clones observe the same signal. Cancelling is idempotent, and the signal
/// is level-triggered: a sequence that starts after [`cancel`](Self::cancel)
/// fired still resolves as cancelled immediately.
#[derive(Debug, Clone)]
pub struct CancelToken {
    tx: Arc<watch::Sender<bool>>,
    rx: watch::Receiver<bool>,
}

impl CancelToken {
    /// A fresh, un-fired token.
    pub fn new() -> Self {
        let (tx, rx) = watch::channel(false);
        Self { tx: Arc::new(tx), rx }
    }

    /// Fire the signal. Safe to call more than once, from any clone.
    pub fn cancel(&self) {
        // Receivers live inside every clone of this token, so send cannot
        // fail while a clone exists; ignore the impossible error.
        let _ = self.tx.send(true);
    }

    /// Whether the signal has fired.
    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once the signal fires; immediately if it already has.
    pub async fn cancelled(&self) {
        let mut rx = self.rx.clone();
        // wait_for errors only when every sender is gone, and we hold one.
        let _ = rx.wait_for(|cancelled| *cancelled).await;
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

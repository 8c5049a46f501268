//! Cancellation handle for an in-flight response stream.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio_util::sync::CancellationToken;

/// Aborts one in-flight response stream.
///
/// Clones share state. The handle is available before the first byte is read;
/// once the stream settles (terminal event, end of input, or cancellation)
/// further calls to [`cancel`](Self::cancel) do nothing.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle {
    token: CancellationToken,
    settled: Arc<AtomicBool>,
}

impl CancelHandle {
    /// Create a fresh, unsettled handle.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    ///
    /// Returns `true` only for the call that actually cancelled the stream.
    pub fn cancel(&self) -> bool {
        if self.settled.swap(true, Ordering::AcqRel) {
            return false;
        }
        self.token.cancel();
        true
    }

    /// Whether cancellation was requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Whether the stream has settled, by cancellation or otherwise.
    #[must_use]
    pub fn is_settled(&self) -> bool {
        self.settled.load(Ordering::Acquire)
    }

    /// Mark the stream as finished so later cancels are no-ops.
    pub fn settle(&self) {
        self.settled.store(true, Ordering::Release);
    }

    /// The underlying token, for racing against other futures.
    #[must_use]
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancel_is_idempotent() {
        let handle = CancelHandle::new();
        assert!(handle.cancel());
        assert!(!handle.cancel());
        assert!(handle.is_cancelled());
    }

    #[test]
    fn cancel_after_settle_is_noop() {
        let handle = CancelHandle::new();
        handle.settle();
        assert!(!handle.cancel());
        assert!(!handle.is_cancelled());
    }

    #[test]
    fn clones_share_state() {
        let handle = CancelHandle::new();
        let other = handle.clone();
        assert!(other.cancel());
        assert!(handle.is_cancelled());
        assert!(handle.is_settled());
    }

    #[tokio::test]
    async fn token_future_resolves_on_cancel() {
        let handle = CancelHandle::new();
        let waiter = handle.clone();
        let task = tokio::spawn(async move { waiter.token().cancelled().await });
        handle.cancel();
        task.await.unwrap();
    }
}

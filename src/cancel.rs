use std::sync::{Arc, Condvar, Mutex};
use std::time::Duration;

/// Cloneable handle that can abort a poll loop from another thread.
///
/// The poll loop parks on [`CancelToken::wait_timeout`] between status
/// checks; calling [`CancelToken::cancel`] wakes the waiter immediately
/// instead of letting the sleep run out.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    inner: Arc<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    cancelled: Mutex<bool>,
    signal: Condvar,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation. Idempotent.
    pub fn cancel(&self) {
        let mut cancelled = self
            .inner
            .cancelled
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        *cancelled = true;
        self.inner.signal.notify_all();
    }

    pub fn is_cancelled(&self) -> bool {
        *self
            .inner
            .cancelled
            .lock()
            .unwrap_or_else(|e| e.into_inner())
    }

    /// Waits up to `timeout`, returning early if cancelled. Returns `true`
    /// when cancellation was requested.
    pub(crate) fn wait_timeout(&self, timeout: Duration) -> bool {
        let cancelled = self
            .inner
            .cancelled
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        let (cancelled, _) = self
            .inner
            .signal
            .wait_timeout_while(cancelled, timeout, |cancelled| !*cancelled)
            .unwrap_or_else(|e| e.into_inner());
        *cancelled
    }
}

//! Completion tracking for a pool of workers.
//!
//! [`CompletionTracker`] counts live workers. Each worker holds a
//! [`CompletionGuard`] obtained from [`CompletionTracker::register`] before it
//! starts; dropping the guard releases the registration. Because release is
//! tied to `Drop`, it happens exactly once per worker, whether the worker
//! returns normally or unwinds from a panic.
//!
//! A watcher blocks in [`CompletionTracker::wait`] (or awaits
//! [`CompletionTracker::wait_async`] with the `async-tokio` feature) until the
//! count reaches zero and then performs its single closing action. All
//! registrations must happen before the watcher starts waiting, otherwise it
//! may observe an empty pool and return early.

use parking_lot::{Condvar, Mutex};
use std::sync::Arc;

#[derive(Default)]
struct Inner {
    live: Mutex<usize>,
    zero: Condvar,
    #[cfg(feature = "async-tokio")]
    notify: tokio::sync::Notify,
}

/// Shared counter of live workers. Cloning yields another handle to the same
/// count.
#[derive(Clone, Default)]
pub struct CompletionTracker {
    inner: Arc<Inner>,
}

impl CompletionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers one worker. The registration lasts as long as the returned
    /// guard.
    #[must_use = "dropping the guard immediately releases the registration"]
    pub fn register(&self) -> CompletionGuard {
        *self.inner.live.lock() += 1;
        CompletionGuard {
            inner: Arc::clone(&self.inner),
        }
    }

    /// Number of registrations not yet released.
    pub fn live(&self) -> usize {
        *self.inner.live.lock()
    }

    /// Blocks the current thread until every registration has been released.
    pub fn wait(&self) {
        let mut live = self.inner.live.lock();
        while *live > 0 {
            self.inner.zero.wait(&mut live);
        }
    }

    /// Suspends the current task until every registration has been released.
    #[cfg(feature = "async-tokio")]
    pub async fn wait_async(&self) {
        loop {
            let mut notified = core::pin::pin!(self.inner.notify.notified());
            // Register interest before checking so a release between the check
            // and the await is not missed.
            notified.as_mut().enable();
            if self.live() == 0 {
                return;
            }
            notified.await;
        }
    }
}

/// A live worker registration. Dropping it releases the registration.
pub struct CompletionGuard {
    inner: Arc<Inner>,
}

impl Drop for CompletionGuard {
    fn drop(&mut self) {
        let mut live = self.inner.live.lock();
        // A guard only exists while its registration is counted.
        debug_assert!(*live > 0, "completion count underflow");
        *live -= 1;
        if *live == 0 {
            self.inner.zero.notify_all();
            #[cfg(feature = "async-tokio")]
            self.inner.notify.notify_waiters();
        }
    }
}

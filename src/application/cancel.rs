//! Cooperative cancellation
//!
//! One token is shared by every stage of a build. Stages poll it at their
//! checkpoints; blocking waits use [`CancellationToken::wait_timeout`] so they
//! wake as soon as the token fires.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::error::{PacksmithError, PacksmithResult};

type Callback = Box<dyn FnOnce() + Send>;

#[derive(Default)]
struct Inner {
    cancelled: AtomicBool,
    callbacks: Mutex<Vec<Callback>>,
    signal: Condvar,
}

/// Cloneable handle to a shared cancellation flag
#[derive(Clone, Default)]
pub struct CancellationToken {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for CancellationToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancellationToken")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fire the token. Only the first call runs the registered callbacks.
    pub fn cancel(&self) {
        let callbacks = {
            let mut guard = self.lock();
            if self.inner.cancelled.swap(true, Ordering::SeqCst) {
                return;
            }
            std::mem::take(&mut *guard)
        };
        self.inner.signal.notify_all();

        for callback in callbacks {
            callback();
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }

    /// Checkpoint: `Err(Cancelled)` once the token has fired
    pub fn check(&self) -> PacksmithResult<()> {
        if self.is_cancelled() {
            Err(PacksmithError::Cancelled)
        } else {
            Ok(())
        }
    }

    /// Sleep up to `timeout`, waking early on cancellation.
    ///
    /// Returns `true` if the token fired.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let guard = self.lock();
        let _guard = self
            .inner
            .signal
            .wait_timeout_while(guard, timeout, |_| !self.is_cancelled())
            .unwrap_or_else(PoisonError::into_inner);
        self.is_cancelled()
    }

    /// Block until the token fires
    pub fn wait(&self) {
        let guard = self.lock();
        let _guard = self
            .inner
            .signal
            .wait_while(guard, |_| !self.is_cancelled())
            .unwrap_or_else(PoisonError::into_inner);
    }

    /// Run `callback` on cancellation, immediately if already cancelled
    pub fn on_cancel(&self, callback: impl FnOnce() + Send + 'static) {
        {
            let mut guard = self.lock();
            if !self.is_cancelled() {
                guard.push(Box::new(callback));
                return;
            }
        }
        callback();
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Callback>> {
        self.inner
            .callbacks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::time::Instant;

    #[test]
    fn new_token_is_not_cancelled() {
        let token = CancellationToken::new();
        assert!(!token.is_cancelled());
        assert!(token.check().is_ok());
    }

    #[test]
    fn cancel_is_visible_through_clones() {
        let token = CancellationToken::new();
        let clone = token.clone();
        clone.cancel();

        assert!(token.is_cancelled());
        assert!(token.check().unwrap_err().is_cancelled());
    }

    #[test]
    fn callbacks_run_once() {
        let token = CancellationToken::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        token.on_cancel(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        token.cancel();
        token.cancel();
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn late_callback_runs_immediately() {
        let token = CancellationToken::new();
        token.cancel();

        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        token.on_cancel(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn wait_timeout_expires_without_cancel() {
        let token = CancellationToken::new();
        assert!(!token.wait_timeout(Duration::from_millis(20)));
    }

    #[test]
    fn wait_timeout_wakes_on_cancel() {
        let token = CancellationToken::new();
        let remote = token.clone();
        let started = Instant::now();

        let handle = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(30));
            remote.cancel();
        });

        assert!(token.wait_timeout(Duration::from_secs(10)));
        assert!(started.elapsed() < Duration::from_secs(5));
        handle.join().unwrap();
    }

    #[test]
    fn wait_returns_after_cancel() {
        let token = CancellationToken::new();
        let remote = token.clone();
        let handle = std::thread::spawn(move || remote.cancel());

        token.wait();
        assert!(token.is_cancelled());
        handle.join().unwrap();
    }
}

//! Debounce window for rebuild triggers

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::time::{Duration, Instant};

/// Quiet period after the last notification before a rebuild fires
pub const DEBOUNCE_MS: u64 = 100;

/// How often the watch loop polls its channel and the cancellation token
pub const POLL_INTERVAL_MS: u64 = 50;

/// Pending notifications plus the time of the latest one.
///
/// Every notification re-arms the window.
#[derive(Debug)]
pub struct Debouncer {
    window: Duration,
    pending: BTreeSet<PathBuf>,
    last_change: Option<Instant>,
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new()
    }
}

impl Debouncer {
    pub fn new() -> Self {
        Self::with_window(Duration::from_millis(DEBOUNCE_MS))
    }

    pub fn with_window(window: Duration) -> Self {
        Self {
            window,
            pending: BTreeSet::new(),
            last_change: None,
        }
    }

    pub fn record(&mut self, path: PathBuf) {
        self.record_at(path, Instant::now());
    }

    pub fn record_at(&mut self, path: PathBuf, at: Instant) {
        self.pending.insert(path);
        self.last_change = Some(at);
    }

    /// Whether the window has elapsed with something pending
    pub fn is_ready(&self) -> bool {
        self.is_ready_at(Instant::now())
    }

    pub fn is_ready_at(&self, now: Instant) -> bool {
        match self.last_change {
            Some(last) => {
                !self.pending.is_empty() && now.saturating_duration_since(last) >= self.window
            }
            None => false,
        }
    }

    /// Drain the pending set, closing the window
    pub fn take(&mut self) -> Vec<PathBuf> {
        self.last_change = None;
        std::mem::take(&mut self.pending).into_iter().collect()
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }
}

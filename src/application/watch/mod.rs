//! Watch support
//!
//! - `PackWatcher` - recursive `notify` watch over one pack's source tree,
//!   filtered by the pack's include/exclude predicate
//! - `Debouncer` - collapses bursts of notifications into one rebuild
//!
//! The loop that ties them to rebuilds lives in the build use case.

mod debounce;
mod pack_watcher;


pub use debounce::{Debouncer, DEBOUNCE_MS, POLL_INTERVAL_MS};
pub use pack_watcher::{PackWatcher, WatchNotification};

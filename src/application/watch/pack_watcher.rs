//! Filesystem watcher scoped to one pack

use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;

use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tracing::{debug, info, warn};

use crate::domain::value_objects::{PackFilter, PackKind};
use crate::error::PacksmithResult;

/// A filtered change under one pack's source tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchNotification {
    pub pack: PackKind,
    pub path: PathBuf,
}

/// Recursive watch over a pack's `src_dir`.
///
/// Paths rejected by the pack's filter are dropped inside the notify
/// callback and never reach the channel.
pub struct PackWatcher {
    pack: PackKind,
    root: PathBuf,
    watcher: RecommendedWatcher,
}

impl PackWatcher {
    pub fn start(
        pack: PackKind,
        filter: PackFilter,
        tx: Sender<WatchNotification>,
    ) -> PacksmithResult<Self> {
        let root = filter.root().to_path_buf();
        // notify may report canonical paths (e.g. /private/var on macOS)
        let canonical = std::fs::canonicalize(&root).unwrap_or_else(|_| root.clone());

        let mut watcher = RecommendedWatcher::new(
            move |res: Result<Event, notify::Error>| {
                let event = match res {
                    Ok(event) => event,
                    Err(e) => {
                        warn!("watch error: {e}");
                        return;
                    }
                };
                if matches!(event.kind, EventKind::Access(_)) {
                    return;
                }

                for path in event.paths {
                    if !is_relevant(&filter, &canonical, &path) {
                        continue;
                    }
                    // the receiver is gone once the build loop stops
                    let _ = tx.send(WatchNotification { pack, path });
                }
            },
            Config::default(),
        )?;

        watcher.watch(&root, RecursiveMode::Recursive)?;
        info!("Watching {}", root.display());

        Ok(Self {
            pack,
            root,
            watcher,
        })
    }

    pub fn pack(&self) -> PackKind {
        self.pack
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Stop watching. No notification is sent after this returns.
    pub fn close(mut self) {
        if let Err(e) = self.watcher.unwatch(&self.root) {
            debug!("unwatch {}: {e}", self.root.display());
        }
        drop(self.watcher);
        info!(pack = %self.pack, "Stopped watching {}", self.root.display());
    }
}

/// Whether an event path should trigger a rebuild.
///
/// A path that no longer exists may have been a directory, so it passes if
/// either reading of it is included.
pub(super) fn is_relevant(filter: &PackFilter, canonical_root: &Path, path: &Path) -> bool {
    let rel = match path
        .strip_prefix(filter.root())
        .or_else(|_| path.strip_prefix(canonical_root))
    {
        Ok(rel) => rel,
        Err(_) => return false,
    };
    if rel.as_os_str().is_empty() {
        return false;
    }
    match std::fs::metadata(path) {
        Ok(meta) => filter.is_included(rel, meta.is_dir()),
        Err(_) => filter.is_included(rel, true) || filter.is_included(rel, false),
    }
}

//! Per-pack modification-time cache
//!
//! A snapshot maps every included source file to the modification time seen
//! during the last successful cycle. Snapshots are replaced wholesale, never
//! patched, so a failed cycle leaves the previous one intact.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

/// Modification time in nanoseconds since the Unix epoch
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Timestamp(pub u128);

impl Timestamp {
    /// Times before the epoch collapse to zero
    pub fn from_system_time(time: SystemTime) -> Self {
        Self(
            time.duration_since(UNIX_EPOCH)
                .map(|d| d.as_nanos())
                .unwrap_or(0),
        )
    }

    pub fn as_nanos(self) -> u128 {
        self.0
    }
}

impl From<SystemTime> for Timestamp {
    fn from(time: SystemTime) -> Self {
        Self::from_system_time(time)
    }
}

/// Absolute source path to last-seen modification time
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackCache {
    entries: HashMap<PathBuf, Timestamp>,
}

impl PackCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, path: &Path) -> Option<Timestamp> {
        self.entries.get(path).copied()
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.entries.contains_key(path)
    }

    pub fn insert(&mut self, path: PathBuf, timestamp: Timestamp) -> Option<Timestamp> {
        self.entries.insert(path, timestamp)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Path, Timestamp)> {
        self.entries.iter().map(|(p, t)| (p.as_path(), *t))
    }

    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.entries.keys().map(PathBuf::as_path)
    }
}

impl FromIterator<(PathBuf, Timestamp)> for PackCache {
    fn from_iter<I: IntoIterator<Item = (PathBuf, Timestamp)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl Extend<(PathBuf, Timestamp)> for PackCache {
    fn extend<I: IntoIterator<Item = (PathBuf, Timestamp)>>(&mut self, iter: I) {
        self.entries.extend(iter);
    }
}

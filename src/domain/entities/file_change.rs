//! File change events produced by change detection

use std::fmt;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ChangeKind {
    Add,
    Change,
    Remove,
}

impl ChangeKind {
    pub fn label(self) -> &'static str {
        match self {
            ChangeKind::Add => "add",
            ChangeKind::Change => "change",
            ChangeKind::Remove => "remove",
        }
    }
}

/// A source file that was added, modified or deleted since the last cycle
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FileChange {
    pub kind: ChangeKind,
    /// Absolute source path
    pub path: PathBuf,
}

impl FileChange {
    pub fn add(path: impl Into<PathBuf>) -> Self {
        Self {
            kind: ChangeKind::Add,
            path: path.into(),
        }
    }

    pub fn change(path: impl Into<PathBuf>) -> Self {
        Self {
            kind: ChangeKind::Change,
            path: path.into(),
        }
    }

    pub fn remove(path: impl Into<PathBuf>) -> Self {
        Self {
            kind: ChangeKind::Remove,
            path: path.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_remove(&self) -> bool {
        self.kind == ChangeKind::Remove
    }
}

impl fmt::Display for FileChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind.label(), self.path.display())
    }
}

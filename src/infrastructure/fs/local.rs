//! Local file operations used by the compiler
//!
//! All writes go through a temp file in the destination directory followed by
//! a rename, so readers never observe a half-written output file.

use std::fs;
use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;

use crate::error::{PacksmithError, PacksmithResult};

/// Write `content` to `path` atomically, creating parent directories.
pub fn atomic_write(path: &Path, content: &[u8]) -> PacksmithResult<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent).map_err(|e| PacksmithError::io_at(parent, e))?;

    let mut temp = NamedTempFile::new_in(parent).map_err(|e| PacksmithError::io_at(parent, e))?;
    temp.write_all(content)
        .and_then(|_| temp.flush())
        .map_err(|e| PacksmithError::io_at(temp.path(), e))?;
    temp.persist(path)
        .map_err(|e| PacksmithError::io_at(path, e.error))?;

    Ok(())
}

/// Delete `path`, then its parent directory if that became empty.
///
/// Only the immediate parent is pruned, and never `stop_at` itself. A file
/// that is already gone is not an error.
pub fn remove_and_prune(path: &Path, stop_at: &Path) -> PacksmithResult<()> {
    match fs::remove_file(path) {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(PacksmithError::io_at(path, e)),
    }

    let Some(parent) = path.parent() else {
        return Ok(());
    };
    if parent == stop_at || !parent.starts_with(stop_at) {
        return Ok(());
    }

    let is_empty = fs::read_dir(parent)
        .map(|mut entries| entries.next().is_none())
        .unwrap_or(false);
    if is_empty {
        // a concurrent write may have refilled it
        let _ = fs::remove_dir(parent);
    }

    Ok(())
}

/// Remove a directory tree if it exists.
pub fn remove_dir_if_exists(dir: &Path) -> PacksmithResult<()> {
    match fs::remove_dir_all(dir) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(PacksmithError::io_at(dir, e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn atomic_write_creates_parent_dirs() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("nested").join("dir").join("a.json");

        atomic_write(&file, b"{}").unwrap();

        assert_eq!(fs::read_to_string(&file).unwrap(), "{}");
    }

    #[test]
    fn atomic_write_overwrites_and_leaves_no_temp_files() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("a.txt");
        fs::write(&file, "old").unwrap();

        atomic_write(&file, b"new").unwrap();

        assert_eq!(fs::read_to_string(&file).unwrap(), "new");
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn remove_prunes_empty_parent() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("items").join("sword.json");
        atomic_write(&file, b"{}").unwrap();

        remove_and_prune(&file, dir.path()).unwrap();

        assert!(!file.exists());
        assert!(!dir.path().join("items").exists());
        assert!(dir.path().exists());
    }

    #[test]
    fn remove_keeps_parent_with_siblings() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("items").join("sword.json");
        let sibling = dir.path().join("items").join("axe.json");
        atomic_write(&file, b"{}").unwrap();
        atomic_write(&sibling, b"{}").unwrap();

        remove_and_prune(&file, dir.path()).unwrap();

        assert!(!file.exists());
        assert!(sibling.exists());
    }

    #[test]
    fn remove_never_prunes_root() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("out");
        let file = root.join("only.json");
        atomic_write(&file, b"{}").unwrap();

        remove_and_prune(&file, &root).unwrap();

        assert!(root.exists());
    }

    #[test]
    fn remove_missing_file_is_ok() {
        let dir = tempdir().unwrap();
        remove_and_prune(&dir.path().join("gone.json"), dir.path()).unwrap();
    }
}

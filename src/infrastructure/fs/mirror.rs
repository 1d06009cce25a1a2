//! Mirror a compiled pack into extra target directories

use std::fs;
use std::path::Path;

use tracing::debug;
use walkdir::WalkDir;

use crate::application::cancel::CancellationToken;
use crate::error::{PacksmithError, PacksmithResult};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MirrorStats {
    pub copied: usize,
    pub removed: usize,
}

/// Make `dest` an exact copy of `src`.
///
/// Files are copied when their size or modification time differ, and the
/// copy takes the source's mtime so unchanged files are skipped next time.
/// Anything in `dest` without a counterpart in `src` is deleted.
pub fn mirror_dir(src: &Path, dest: &Path, token: &CancellationToken) -> PacksmithResult<MirrorStats> {
    let mut stats = MirrorStats::default();
    fs::create_dir_all(dest).map_err(|e| PacksmithError::io_at(dest, e))?;

    for entry in WalkDir::new(src).min_depth(1) {
        token.check()?;
        let entry = entry.map_err(walk_error)?;
        let Ok(rel) = entry.path().strip_prefix(src) else {
            continue;
        };
        let target = dest.join(rel);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target).map_err(|e| PacksmithError::io_at(&target, e))?;
            continue;
        }

        let meta = entry
            .metadata()
            .map_err(|e| PacksmithError::io_at(entry.path(), e.into()))?;
        if is_up_to_date(&meta, &target) {
            continue;
        }

        fs::copy(entry.path(), &target).map_err(|e| PacksmithError::io_at(&target, e))?;
        if let Ok(modified) = meta.modified() {
            fs::File::options()
                .write(true)
                .open(&target)
                .and_then(|f| f.set_modified(modified))
                .map_err(|e| PacksmithError::io_at(&target, e))?;
        }
        stats.copied += 1;
    }

    let mut walker = WalkDir::new(dest).min_depth(1).into_iter();
    while let Some(entry) = walker.next() {
        token.check()?;
        let entry = entry.map_err(walk_error)?;
        let Ok(rel) = entry.path().strip_prefix(dest) else {
            continue;
        };
        if src.join(rel).exists() {
            continue;
        }

        if entry.file_type().is_dir() {
            fs::remove_dir_all(entry.path()).map_err(|e| PacksmithError::io_at(entry.path(), e))?;
            walker.skip_current_dir();
        } else {
            fs::remove_file(entry.path()).map_err(|e| PacksmithError::io_at(entry.path(), e))?;
        }
        stats.removed += 1;
    }

    debug!(
        copied = stats.copied,
        removed = stats.removed,
        "mirrored {} -> {}",
        src.display(),
        dest.display()
    );
    Ok(stats)
}

fn is_up_to_date(source: &fs::Metadata, target: &Path) -> bool {
    let Ok(existing) = fs::metadata(target) else {
        return false;
    };
    existing.is_file()
        && existing.len() == source.len()
        && matches!(
            (existing.modified(), source.modified()),
            (Ok(a), Ok(b)) if a == b
        )
}

fn walk_error(e: walkdir::Error) -> PacksmithError {
    let path = e.path().map(Path::to_path_buf).unwrap_or_default();
    PacksmithError::io_at(path, e.into())
}

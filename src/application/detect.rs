//! Change detection
//!
//! Walks a pack's source tree level by level, fanning each level's
//! directories out over the rayon pool, and diffs the modification times it
//! finds against the previous cache snapshot.
//!
//! Detection is timestamp-based. A rewrite that preserves the file's mtime
//! is not noticed.

use std::fs;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use tracing::{debug, warn};

use crate::application::cancel::CancellationToken;
use crate::domain::entities::{FileChange, PackCache, Timestamp};
use crate::domain::value_objects::PackFilter;
use crate::error::{PacksmithError, PacksmithResult};

/// Result of one scan
#[derive(Debug, Clone, Default)]
pub struct Detection {
    /// Changes sorted by path
    pub changes: Vec<FileChange>,
    /// Snapshot of every included file seen by this scan
    pub cache: PackCache,
}

#[derive(Default)]
struct DirScan {
    dirs: Vec<PathBuf>,
    files: Vec<(PathBuf, Timestamp)>,
    /// Files and directories that errored; nothing under them is removed
    skipped: Vec<PathBuf>,
}

/// Scan `filter.root()` and compare it against `previous`.
///
/// Entries that cannot be listed or stat'ed are logged and left out of both
/// the new snapshot and the change list; a transient error never turns into
/// a `Remove`. Only an unreadable root fails the scan.
pub fn detect_changes(
    filter: &PackFilter,
    previous: &PackCache,
    token: &CancellationToken,
) -> PacksmithResult<Detection> {
    token.check()?;

    let root = filter.root();
    match fs::metadata(root) {
        Ok(meta) if meta.is_dir() => {}
        _ => {
            return Err(PacksmithError::SourceDirNotFound {
                path: root.to_path_buf(),
            })
        }
    }

    let mut cache = PackCache::new();
    let mut skipped: Vec<PathBuf> = Vec::new();
    let mut level = vec![root.to_path_buf()];

    while !level.is_empty() {
        token.check()?;
        debug!(dirs = level.len(), "scanning directory level");

        let scans = level
            .par_iter()
            .map(|dir| scan_dir(dir, filter, token))
            .collect::<PacksmithResult<Vec<_>>>()?;

        level = Vec::new();
        for scan in scans {
            level.extend(scan.dirs);
            cache.extend(scan.files);
            skipped.extend(scan.skipped);
        }
    }

    let mut changes: Vec<FileChange> = cache
        .iter()
        .filter_map(|(path, timestamp)| match previous.get(path) {
            None => Some(FileChange::add(path)),
            Some(seen) if seen != timestamp => Some(FileChange::change(path)),
            Some(_) => None,
        })
        .collect();

    changes.extend(
        previous
            .paths()
            .filter(|path| !cache.contains(path))
            .filter(|path| !skipped.iter().any(|s| path.starts_with(s)))
            .map(FileChange::remove),
    );
    changes.sort_by(|a, b| a.path.cmp(&b.path));

    Ok(Detection { changes, cache })
}

fn scan_dir(dir: &Path, filter: &PackFilter, token: &CancellationToken) -> PacksmithResult<DirScan> {
    token.check()?;

    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if dir == filter.root() => return Err(PacksmithError::io_at(dir, e)),
        Err(e) => {
            warn!("skipping unreadable directory {}: {e}", dir.display());
            return Ok(DirScan {
                skipped: vec![dir.to_path_buf()],
                ..DirScan::default()
            });
        }
    };

    let mut scan = DirScan::default();
    for entry in entries {
        token.check()?;

        let path = match entry {
            Ok(entry) => entry.path(),
            Err(e) => {
                warn!("skipping entry in {}: {e}", dir.display());
                continue;
            }
        };
        let Ok(rel) = path.strip_prefix(filter.root()) else {
            continue;
        };

        // follows symlinks
        let meta = match fs::metadata(&path) {
            Ok(meta) => meta,
            Err(e) => {
                warn!("skipping {}: {e}", path.display());
                scan.skipped.push(path);
                continue;
            }
        };

        if meta.is_dir() {
            if filter.is_included(rel, true) {
                scan.dirs.push(path);
            }
        } else if meta.is_file() && filter.is_included(rel, false) {
            match meta.modified() {
                Ok(modified) => scan.files.push((path, Timestamp::from(modified))),
                Err(e) => {
                    warn!("skipping {}: {e}", path.display());
                    scan.skipped.push(path);
                }
            }
        }
    }

    Ok(scan)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::ChangeKind;
    use proptest::prelude::*;
    use std::time::{Duration, Instant, SystemTime};
    use tempfile::tempdir;

    fn write(root: &Path, rel: &str, content: &str) -> PathBuf {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, content).unwrap();
        path
    }

    fn set_mtime(path: &Path, time: SystemTime) {
        let file = fs::File::options().write(true).open(path).unwrap();
        file.set_modified(time).unwrap();
    }

    fn kinds(detection: &Detection) -> Vec<(ChangeKind, PathBuf)> {
        detection
            .changes
            .iter()
            .map(|c| (c.kind, c.path.clone()))
            .collect()
    }

    #[test]
    fn first_scan_reports_every_file_as_added() {
        let dir = tempdir().unwrap();
        let a = write(dir.path(), "a.json", "{}");
        let b = write(dir.path(), "items/deep/b.json", "{}");

        let filter = PackFilter::allow_all(dir.path()).unwrap();
        let detection =
            detect_changes(&filter, &PackCache::new(), &CancellationToken::new()).unwrap();

        assert_eq!(
            kinds(&detection),
            vec![(ChangeKind::Add, a.clone()), (ChangeKind::Add, b.clone())]
        );
        assert_eq!(detection.cache.len(), 2);
        assert!(detection.cache.contains(&a));
    }

    #[test]
    fn modified_and_removed_files_are_reported() {
        let dir = tempdir().unwrap();
        let keep = write(dir.path(), "keep.json", "{}");
        let edit = write(dir.path(), "edit.json", "{}");
        let gone = write(dir.path(), "gone.json", "{}");

        let filter = PackFilter::allow_all(dir.path()).unwrap();
        let token = CancellationToken::new();
        let first = detect_changes(&filter, &PackCache::new(), &token).unwrap();

        set_mtime(&edit, SystemTime::now() + Duration::from_secs(60));
        fs::remove_file(&gone).unwrap();

        let second = detect_changes(&filter, &first.cache, &token).unwrap();
        assert_eq!(
            kinds(&second),
            vec![(ChangeKind::Change, edit), (ChangeKind::Remove, gone)]
        );
        assert!(second.cache.contains(&keep));
        assert_eq!(second.cache.len(), 2);
    }

    #[test]
    fn content_change_with_same_mtime_goes_unnoticed() {
        let dir = tempdir().unwrap();
        let file = write(dir.path(), "block.json", "{\"a\": 1}");
        let pinned = SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000);
        set_mtime(&file, pinned);

        let filter = PackFilter::allow_all(dir.path()).unwrap();
        let token = CancellationToken::new();
        let first = detect_changes(&filter, &PackCache::new(), &token).unwrap();

        fs::write(&file, "{\"a\": 2}").unwrap();
        set_mtime(&file, pinned);

        let second = detect_changes(&filter, &first.cache, &token).unwrap();
        assert!(second.changes.is_empty());
    }

    #[test]
    fn excluded_paths_are_never_reported() {
        let dir = tempdir().unwrap();
        write(dir.path(), "notes/todo.md", "x");
        write(dir.path(), "README.md", "x");
        let kept = write(dir.path(), "items/a.json", "{}");

        let filter = PackFilter::new(
            dir.path(),
            &[],
            &["*.md".to_string(), "notes/".to_string()],
        )
        .unwrap();
        let detection =
            detect_changes(&filter, &PackCache::new(), &CancellationToken::new()).unwrap();

        assert_eq!(kinds(&detection), vec![(ChangeKind::Add, kept)]);
    }

    #[test]
    fn newly_excluded_cached_file_is_removed() {
        let dir = tempdir().unwrap();
        let file = write(dir.path(), "draft.json", "{}");
        let token = CancellationToken::new();

        let all = PackFilter::allow_all(dir.path()).unwrap();
        let first = detect_changes(&all, &PackCache::new(), &token).unwrap();

        let narrowed = PackFilter::new(dir.path(), &[], &["draft.json".to_string()]).unwrap();
        let second = detect_changes(&narrowed, &first.cache, &token).unwrap();

        assert_eq!(kinds(&second), vec![(ChangeKind::Remove, file)]);
        assert!(second.cache.is_empty());
    }

    #[test]
    fn missing_root_fails() {
        let dir = tempdir().unwrap();
        let filter = PackFilter::allow_all(dir.path().join("nope")).unwrap();

        let err = detect_changes(&filter, &PackCache::new(), &CancellationToken::new())
            .unwrap_err();
        assert!(matches!(err, PacksmithError::SourceDirNotFound { .. }));
    }

    #[test]
    fn cancelled_before_scan() {
        let dir = tempdir().unwrap();
        write(dir.path(), "a.json", "{}");
        let token = CancellationToken::new();
        token.cancel();

        let filter = PackFilter::allow_all(dir.path()).unwrap();
        let err = detect_changes(&filter, &PackCache::new(), &token).unwrap_err();
        assert!(err.is_cancelled());
    }

    #[cfg(unix)]
    #[test]
    fn unreadable_cached_file_is_not_removed() {
        let dir = tempdir().unwrap();
        let link = write(dir.path(), "link.json", "{}");
        let token = CancellationToken::new();

        let filter = PackFilter::allow_all(dir.path()).unwrap();
        let first = detect_changes(&filter, &PackCache::new(), &token).unwrap();
        assert!(first.cache.contains(&link));

        // a self-referencing symlink fails to stat with ELOOP
        fs::remove_file(&link).unwrap();
        std::os::unix::fs::symlink("link.json", &link).unwrap();

        let second = detect_changes(&filter, &first.cache, &token).unwrap();
        assert!(second.changes.is_empty(), "got {:?}", second.changes);
        assert!(!second.cache.contains(&link));
    }

    #[cfg(unix)]
    #[test]
    fn files_under_unreadable_directory_are_not_removed() {
        let dir = tempdir().unwrap();
        let nested = write(dir.path(), "items/sword.json", "{}");
        let kept = write(dir.path(), "other.json", "{}");
        let token = CancellationToken::new();

        let filter = PackFilter::allow_all(dir.path()).unwrap();
        let first = detect_changes(&filter, &PackCache::new(), &token).unwrap();

        let items = dir.path().join("items");
        fs::remove_dir_all(&items).unwrap();
        std::os::unix::fs::symlink("items", &items).unwrap();

        let second = detect_changes(&filter, &first.cache, &token).unwrap();
        assert!(second.changes.is_empty(), "got {:?}", second.changes);
        assert!(!second.cache.contains(&nested));
        assert!(second.cache.contains(&kept));
    }

    #[test]
    fn cancellation_mid_scan_returns_promptly() {
        let dir = tempdir().unwrap();
        // a deep chain forces hundreds of sequential levels
        let mut level = dir.path().to_path_buf();
        for _ in 0..1000 {
            level.push("d");
            fs::create_dir(&level).unwrap();
            for i in 0..4 {
                fs::write(level.join(format!("{i}.json")), "{}").unwrap();
            }
        }

        let filter = PackFilter::allow_all(dir.path()).unwrap();
        let token = CancellationToken::new();
        let trigger = token.clone();
        let canceller = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(1));
            trigger.cancel();
            Instant::now()
        });

        let err = detect_changes(&filter, &PackCache::new(), &token).unwrap_err();
        let returned = Instant::now();
        let cancelled_at = canceller.join().unwrap();

        assert!(err.is_cancelled());
        assert!(returned.saturating_duration_since(cancelled_at) < Duration::from_secs(1));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(16))]

        #[test]
        fn detection_is_idempotent(
            files in prop::collection::btree_set("[a-c]{1,2}(/[a-c]{1,2}){0,2}\\.json", 1..12)
        ) {
            let dir = tempdir().unwrap();
            for rel in &files {
                write(dir.path(), rel, "{}");
            }

            let filter = PackFilter::allow_all(dir.path()).unwrap();
            let token = CancellationToken::new();
            let first = detect_changes(&filter, &PackCache::new(), &token).unwrap();
            let second = detect_changes(&filter, &first.cache, &token).unwrap();

            prop_assert!(second.changes.is_empty());
            prop_assert_eq!(&second.cache, &first.cache);
            prop_assert_eq!(first.changes.len(), first.cache.len());
        }
    }
}

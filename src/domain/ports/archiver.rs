//! Archive writer port

use std::path::{Path, PathBuf};

use crate::application::cancel::CancellationToken;
use crate::error::PacksmithResult;

/// A compiled pack and the folder name it gets inside the archive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveSource {
    pub root_name: String,
    pub dir: PathBuf,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArchiveReport {
    /// Files written into the archive
    pub entries: usize,
    /// Uncompressed bytes written
    pub bytes: u64,
    /// Files that disappeared between listing and reading
    pub warnings: Vec<String>,
}

/// Packages compiled packs into a single distributable file
pub trait Archiver: Send + Sync {
    /// Write `sources` into `out_file`.
    ///
    /// On cancellation the partial file is removed and `Err(Cancelled)`
    /// returned.
    fn create_archive(
        &self,
        sources: &[ArchiveSource],
        out_file: &Path,
        token: &CancellationToken,
    ) -> PacksmithResult<ArchiveReport>;
}

impl<T: Archiver + ?Sized> Archiver for &T {
    fn create_archive(
        &self,
        sources: &[ArchiveSource],
        out_file: &Path,
        token: &CancellationToken,
    ) -> PacksmithResult<ArchiveReport> {
        (**self).create_archive(sources, out_file, token)
    }
}

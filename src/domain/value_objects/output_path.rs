//! Source-to-output path mapping

use std::path::{Path, PathBuf};

/// Extensions parsed permissively and emitted as canonical `.json`
pub const RELAXED_JSON_EXTENSIONS: &[&str] = &["json5", "jsonc"];

pub fn is_relaxed_json(path: &Path) -> bool {
    has_extension(path, RELAXED_JSON_EXTENSIONS)
}

pub(crate) fn has_extension(path: &Path, candidates: &[&str]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| candidates.iter().any(|c| ext.eq_ignore_ascii_case(c)))
}

/// Maps a source file to its location in the output tree.
///
/// The mapping only depends on the two roots and the relaxed-JSON rename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    src_dir: PathBuf,
    out_dir: PathBuf,
}

impl OutputPaths {
    pub fn new(src_dir: impl Into<PathBuf>, out_dir: impl Into<PathBuf>) -> Self {
        Self {
            src_dir: src_dir.into(),
            out_dir: out_dir.into(),
        }
    }

    pub fn src_dir(&self) -> &Path {
        &self.src_dir
    }

    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }

    /// Path of `source` relative to `src_dir`
    pub fn relative<'a>(&self, source: &'a Path) -> Option<&'a Path> {
        source.strip_prefix(&self.src_dir).ok()
    }

    /// Destination of `source`, or `None` if it lies outside `src_dir`
    pub fn destination(&self, source: &Path) -> Option<PathBuf> {
        let rel = self.relative(source)?;
        let dest = self.out_dir.join(rel);
        if is_relaxed_json(rel) {
            Some(dest.with_extension("json"))
        } else {
            Some(dest)
        }
    }
}

//! Include/exclude predicate for pack source files
//!
//! Patterns use gitignore glob syntax and are matched against paths relative
//! to the pack's `src_dir`. Exclude always wins. Include only applies to
//! files, so directories are descended into unless excluded.

use ignore::gitignore::{Gitignore, GitignoreBuilder};
use std::path::{Path, PathBuf};

use crate::error::{PacksmithError, PacksmithResult};

#[derive(Debug, Clone)]
pub struct PackFilter {
    root: PathBuf,
    include: Gitignore,
    exclude: Gitignore,
    include_count: usize,
}

impl PackFilter {
    /// Compile the pattern lists of one pack rooted at `root`
    pub fn new(root: impl Into<PathBuf>, include: &[String], exclude: &[String]) -> PacksmithResult<Self> {
        let (include, include_count) = build_matcher(include)?;
        let (exclude, _) = build_matcher(exclude)?;
        Ok(Self {
            root: root.into(),
            include,
            exclude,
            include_count,
        })
    }

    /// Filter that accepts everything under `root`
    pub fn allow_all(root: impl Into<PathBuf>) -> PacksmithResult<Self> {
        Self::new(root, &[], &[])
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Test a path relative to the root.
    pub fn is_included(&self, rel_path: &Path, is_dir: bool) -> bool {
        if rel_path.as_os_str().is_empty() || rel_path.has_root() {
            return is_dir && rel_path.as_os_str().is_empty();
        }

        if self
            .exclude
            .matched_path_or_any_parents(rel_path, is_dir)
            .is_ignore()
        {
            return false;
        }

        if is_dir || self.include_count == 0 {
            return true;
        }

        self.include
            .matched_path_or_any_parents(rel_path, false)
            .is_ignore()
    }

    /// Test an absolute path; anything outside the root is rejected.
    pub fn accepts(&self, path: &Path, is_dir: bool) -> bool {
        match path.strip_prefix(&self.root) {
            Ok(rel) => self.is_included(rel, is_dir),
            Err(_) => false,
        }
    }
}

fn build_matcher(patterns: &[String]) -> PacksmithResult<(Gitignore, usize)> {
    let mut builder = GitignoreBuilder::new("");
    let mut count = 0;

    for pattern in patterns {
        let trimmed = pattern.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        builder
            .add_line(None, trimmed)
            .map_err(|e| PacksmithError::InvalidPattern {
                pattern: pattern.clone(),
                message: e.to_string(),
            })?;
        count += 1;
    }

    let matcher = builder.build().map_err(|e| PacksmithError::InvalidPattern {
        pattern: patterns.join(", "),
        message: e.to_string(),
    })?;

    Ok((matcher, count))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter(include: &[&str], exclude: &[&str]) -> PackFilter {
        let include: Vec<String> = include.iter().map(|s| s.to_string()).collect();
        let exclude: Vec<String> = exclude.iter().map(|s| s.to_string()).collect();
        PackFilter::new("/pack", &include, &exclude).unwrap()
    }

    #[test]
    fn empty_filter_includes_everything() {
        let f = filter(&[], &[]);
        assert!(f.is_included(Path::new("items/sword.json"), false));
        assert!(f.is_included(Path::new("items"), true));
    }

    #[test]
    fn exclude_matches_files_and_directories() {
        let f = filter(&[], &["*.md", "drafts/"]);
        assert!(!f.is_included(Path::new("README.md"), false));
        assert!(!f.is_included(Path::new("docs/notes.md"), false));
        assert!(!f.is_included(Path::new("drafts"), true));
        assert!(!f.is_included(Path::new("drafts/wip.json"), false));
        assert!(f.is_included(Path::new("items/a.json"), false));
    }

    #[test]
    fn include_limits_files_but_not_directories() {
        let f = filter(&["*.json"], &[]);
        assert!(f.is_included(Path::new("items/a.json"), false));
        assert!(!f.is_included(Path::new("items/a.txt"), false));
        assert!(f.is_included(Path::new("items"), true));
    }

    #[test]
    fn exclude_wins_over_include() {
        let f = filter(&["*.json"], &["secret.json"]);
        assert!(!f.is_included(Path::new("config/secret.json"), false));
        assert!(f.is_included(Path::new("config/public.json"), false));
    }

    #[test]
    fn include_directory_pattern_covers_children() {
        let f = filter(&["textures/"], &[]);
        assert!(f.is_included(Path::new("textures/blocks/stone.png"), false));
        assert!(!f.is_included(Path::new("sounds/click.ogg"), false));
    }

    #[test]
    fn accepts_rejects_paths_outside_root() {
        let f = filter(&[], &[]);
        assert!(f.accepts(Path::new("/pack/items/a.json"), false));
        assert!(!f.accepts(Path::new("/elsewhere/a.json"), false));
    }

    #[test]
    fn invalid_pattern_is_reported() {
        let err = PackFilter::new("/pack", &["a[".to_string()], &[]).unwrap_err();
        assert!(matches!(err, PacksmithError::InvalidPattern { .. }));
    }
}

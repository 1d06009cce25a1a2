//! Pack compiler
//!
//! One cycle turns a list of source changes into output-tree updates:
//!
//! 1. Scripts of a bundling behavior pack are only noted, never copied.
//! 2. Every other change is applied in parallel (copy, JSON conversion or
//!    delete).
//! 3. The post-steps (bundling, texture list, manifest) then run
//!    concurrently, each at most once per cycle.

mod apply;
mod post_steps;

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use tracing::{debug, info};

use crate::application::cancel::CancellationToken;
use crate::config::PackConfig;
use crate::domain::entities::{FileChange, PackCache};
use crate::domain::ports::ScriptBundler;
use crate::domain::value_objects::{AssetCategory, OutputPaths, PackKind};
use crate::error::{PacksmithError, PacksmithResult};

pub use apply::apply_change;
pub use post_steps::{list_textures, TEXTURE_LIST_FILE};

/// What one cycle did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleSummary {
    pub applied: usize,
    pub removed: usize,
    pub bundled: bool,
    pub texture_list_written: bool,
    pub manifest_written: bool,
}

/// Outcome of a successful cycle, including the cache to adopt
#[derive(Debug, Clone, Default)]
pub struct CycleReport {
    pub summary: CycleSummary,
    pub cache: PackCache,
}

/// How a cycle's changes split up
#[derive(Debug, Default)]
pub(crate) struct Plan {
    pub apply: Vec<FileChange>,
    pub bundle_needed: bool,
    pub texture_list_needed: bool,
    /// Script files handed to the bundler, filled only when bundling
    pub script_sources: Vec<PathBuf>,
}

/// Whether `source` goes to the bundler instead of being copied
fn is_bundled(pack: &PackConfig, paths: &OutputPaths, source: &Path) -> bool {
    pack.scripts().is_some()
        && paths
            .relative(source)
            .is_some_and(|rel| AssetCategory::classify(rel) == AssetCategory::Script)
}

impl Plan {
    pub(crate) fn new(
        pack: &PackConfig,
        paths: &OutputPaths,
        changes: Vec<FileChange>,
        cache: &PackCache,
    ) -> Self {
        let mut plan = Plan::default();

        for change in changes {
            let category = paths
                .relative(&change.path)
                .map(AssetCategory::classify)
                .unwrap_or(AssetCategory::Other);

            match (pack.kind(), category) {
                (PackKind::Behavior, AssetCategory::Script) if pack.scripts().is_some() => {
                    plan.bundle_needed = true;
                }
                (PackKind::Resource, AssetCategory::Texture) if pack.generates_texture_list() => {
                    plan.texture_list_needed = true;
                    plan.apply.push(change);
                }
                _ => plan.apply.push(change),
            }
        }

        if let Some(scripts) = pack.scripts().filter(|_| plan.bundle_needed) {
            let entry = paths.src_dir().join(&scripts.entry);
            let entry_dir = entry.parent().unwrap_or(paths.src_dir());
            let mut sources: Vec<PathBuf> = cache
                .paths()
                .filter(|path| path.starts_with(entry_dir) && is_bundled(pack, paths, path))
                .map(Path::to_path_buf)
                .collect();
            sources.sort();
            plan.script_sources = sources;
        }

        plan
    }
}

/// Fail when two included sources map to one output file, e.g. `a.json`
/// next to `a.json5`
fn check_output_collisions(
    pack: &PackConfig,
    paths: &OutputPaths,
    cache: &PackCache,
) -> PacksmithResult<()> {
    let mut sources: Vec<&Path> = cache
        .paths()
        .filter(|path| !is_bundled(pack, paths, path))
        .collect();
    sources.sort();

    let mut seen: HashMap<PathBuf, &Path> = HashMap::with_capacity(sources.len());
    for source in sources {
        let Some(output) = paths.destination(source) else {
            continue;
        };
        if let Some(first) = seen.insert(output.clone(), source) {
            return Err(PacksmithError::OutputCollision {
                output,
                first: first.to_path_buf(),
                second: source.to_path_buf(),
            });
        }
    }
    Ok(())
}

/// Compiles one pack's changes into its output directory
pub struct PackCompiler<'a, B: ScriptBundler> {
    pack: &'a PackConfig,
    paths: OutputPaths,
    bundler: &'a B,
}

impl<'a, B: ScriptBundler> PackCompiler<'a, B> {
    pub fn new(pack: &'a PackConfig, bundler: &'a B) -> Self {
        Self {
            paths: OutputPaths::new(pack.src_dir(), pack.out_dir()),
            pack,
            bundler,
        }
    }

    /// Run one cycle. `cache` is the scan's new snapshot; it is handed back
    /// only if every step succeeds.
    pub fn compile(
        &self,
        changes: Vec<FileChange>,
        cache: PackCache,
        token: &CancellationToken,
    ) -> PacksmithResult<CycleReport> {
        token.check()?;
        check_output_collisions(self.pack, &self.paths, &cache)?;

        let plan = Plan::new(self.pack, &self.paths, changes, &cache);
        let removed = plan.apply.iter().filter(|c| c.is_remove()).count();
        debug!(
            changes = plan.apply.len(),
            bundle = plan.bundle_needed,
            textures = plan.texture_list_needed,
            "applying changes"
        );

        plan.apply
            .par_iter()
            .try_for_each(|change| apply_change(change, &self.paths, self.pack.common().minify, token))?;

        if !plan.apply.is_empty() {
            info!("Processed {} file(s)", plan.apply.len());
        }

        let post = post_steps::run(self.pack, &plan, self.bundler, token)?;

        Ok(CycleReport {
            summary: CycleSummary {
                applied: plan.apply.len() - removed,
                removed,
                bundled: post.bundled,
                texture_list_written: post.texture_list_written,
                manifest_written: post.manifest_written,
            },
            cache,
        })
    }
}

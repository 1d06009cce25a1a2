//! Once-per-cycle steps that run after all file changes are applied

use std::fs;
use std::path::{Component, Path, PathBuf};
use std::thread::ScopedJoinHandle;

use tracing::{info, warn};
use walkdir::WalkDir;

use crate::application::cancel::CancellationToken;
use crate::config::{PackConfig, ScriptConfig};
use crate::domain::ports::{BundleRequest, ScriptBundler};
use crate::domain::value_objects::AssetCategory;
use crate::error::{PacksmithError, PacksmithResult};
use crate::infrastructure::fs::{atomic_write, remove_and_prune};

use super::Plan;

/// Location of the generated texture list, relative to `out_dir`
pub const TEXTURE_LIST_FILE: &str = "textures/texture_list.json";

#[derive(Debug, Default)]
pub(crate) struct PostStepOutcome {
    pub bundled: bool,
    pub texture_list_written: bool,
    pub manifest_written: bool,
}

pub(crate) fn run<B: ScriptBundler>(
    pack: &PackConfig,
    plan: &Plan,
    bundler: &B,
    token: &CancellationToken,
) -> PacksmithResult<PostStepOutcome> {
    token.check()?;
    let out_dir = pack.out_dir();

    let (bundled, textures, manifest) = std::thread::scope(|s| {
        let bundled = s.spawn(|| match pack.scripts() {
            Some(scripts) if plan.bundle_needed => bundle_scripts(
                pack.src_dir(),
                out_dir,
                scripts,
                &plan.script_sources,
                bundler,
                token,
            )
            .map(|_| true),
            _ => Ok(false),
        });
        let textures = s.spawn(|| {
            if plan.texture_list_needed {
                write_texture_list(out_dir).map(|_| true)
            } else {
                Ok(false)
            }
        });
        let manifest = s.spawn(|| match &pack.common().manifest {
            Some(manifest) => write_manifest(out_dir, manifest).map(|_| true),
            None => Ok(false),
        });

        (join(bundled), join(textures), join(manifest))
    });

    match (bundled, textures, manifest) {
        (Ok(bundled), Ok(texture_list_written), Ok(manifest_written)) => Ok(PostStepOutcome {
            bundled,
            texture_list_written,
            manifest_written,
        }),
        (b, t, m) => Err(first_failure([b.err(), t.err(), m.err()])),
    }
}

/// A real failure outranks a cancellation
fn first_failure(errors: [Option<PacksmithError>; 3]) -> PacksmithError {
    let mut errors: Vec<PacksmithError> = errors.into_iter().flatten().collect();
    match errors.iter().position(|e| !e.is_cancelled()) {
        Some(index) => errors.swap_remove(index),
        None => PacksmithError::Cancelled,
    }
}

fn join<T>(handle: ScopedJoinHandle<'_, PacksmithResult<T>>) -> PacksmithResult<T> {
    handle
        .join()
        .unwrap_or_else(|payload| Err(PacksmithError::from_panic(payload)))
}

fn bundle_scripts<B: ScriptBundler>(
    src_dir: &Path,
    out_dir: &Path,
    scripts: &ScriptConfig,
    sources: &[PathBuf],
    bundler: &B,
    token: &CancellationToken,
) -> PacksmithResult<()> {
    let scripts_out = out_dir.join("scripts");
    clear_bundler_output(&scripts_out)?;
    fs::create_dir_all(&scripts_out).map_err(|e| PacksmithError::io_at(&scripts_out, e))?;

    let request = BundleRequest {
        entry: src_dir.join(&scripts.entry),
        out_dir: scripts_out,
        sources: sources.to_vec(),
        bundle: scripts.bundle,
        minify: scripts.minify,
        source_map: scripts.source_map,
        tsconfig: scripts.tsconfig.clone(),
    };

    let report = bundler.bundle(&request, token)?;
    if report.errors > 0 {
        return Err(PacksmithError::Bundle {
            errors: report.errors,
            message: format!("{} did not compile", request.entry.display()),
        });
    }

    info!("Bundled scripts ({} warning(s))", report.warnings);
    Ok(())
}

/// Delete what a previous bundle emitted (scripts and source maps) from
/// `scripts_out`. Other files there were copied from the sources and stay.
fn clear_bundler_output(scripts_out: &Path) -> PacksmithResult<()> {
    if !scripts_out.is_dir() {
        return Ok(());
    }

    let mut artifacts = Vec::new();
    for entry in WalkDir::new(scripts_out).min_depth(1) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                let path = e.path().map(Path::to_path_buf).unwrap_or_default();
                return Err(PacksmithError::io_at(path, e.into()));
            }
        };
        if entry.file_type().is_file() && is_bundler_artifact(entry.path()) {
            artifacts.push(entry.into_path());
        }
    }

    for artifact in &artifacts {
        remove_and_prune(artifact, scripts_out)?;
    }
    Ok(())
}

fn is_bundler_artifact(path: &Path) -> bool {
    AssetCategory::classify(path) == AssetCategory::Script
        || path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("map"))
}

/// Logical paths of every image under `textures_dir`, sorted.
///
/// Each entry is prefixed with `textures/`, uses `/` separators and has its
/// extension stripped, e.g. `textures/blocks/stone`.
pub fn list_textures(textures_dir: &Path) -> Vec<String> {
    if !textures_dir.is_dir() {
        return Vec::new();
    }

    let mut textures: Vec<String> = WalkDir::new(textures_dir)
        .min_depth(1)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!("skipping texture entry: {e}");
                None
            }
        })
        .filter(|entry| entry.file_type().is_file() && AssetCategory::is_image(entry.path()))
        .filter_map(|entry| {
            let rel = entry.path().strip_prefix(textures_dir).ok()?.with_extension("");
            let parts: Vec<String> = rel
                .components()
                .filter_map(|c| match c {
                    Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
                    _ => None,
                })
                .collect();
            Some(format!("textures/{}", parts.join("/")))
        })
        .collect();

    textures.sort();
    textures
}

fn write_texture_list(out_dir: &Path) -> PacksmithResult<()> {
    let textures = list_textures(&out_dir.join("textures"));
    let bytes = serde_json::to_vec_pretty(&textures)?;
    atomic_write(&out_dir.join(TEXTURE_LIST_FILE), &bytes)?;
    info!("Generated texture list ({} textures)", textures.len());
    Ok(())
}

fn write_manifest(out_dir: &Path, manifest: &serde_json::Value) -> PacksmithResult<()> {
    let bytes = serde_json::to_vec_pretty(manifest)?;
    atomic_write(&out_dir.join("manifest.json"), &bytes)
}

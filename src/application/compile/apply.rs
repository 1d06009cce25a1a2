//! Applying a single file change to the output tree

use std::fs;
use std::path::Path;

use tracing::{trace, warn};

use crate::application::cancel::CancellationToken;
use crate::domain::entities::{ChangeKind, FileChange};
use crate::domain::value_objects::{is_relaxed_json, OutputPaths};
use crate::error::{PacksmithError, PacksmithResult};
use crate::infrastructure::fs::{atomic_write, remove_and_prune};

const MANIFEST_FILE: &str = "manifest.json";

/// Apply `change` to its mapped destination.
///
/// Removals delete the destination and prune its parent if empty. Relaxed
/// JSON is rewritten as canonical JSON; with `minify`, plain JSON is
/// compacted too, except `manifest.json` which is always pretty. Everything
/// else is copied byte for byte.
pub fn apply_change(
    change: &FileChange,
    paths: &OutputPaths,
    minify: bool,
    token: &CancellationToken,
) -> PacksmithResult<()> {
    token.check()?;

    let Some(dest) = paths.destination(&change.path) else {
        warn!("ignoring change outside the pack: {}", change.path.display());
        return Ok(());
    };
    trace!("{change} -> {}", dest.display());

    match change.kind {
        ChangeKind::Remove => remove_and_prune(&dest, paths.out_dir()),
        ChangeKind::Add | ChangeKind::Change => write_output(&change.path, &dest, minify),
    }
}

fn write_output(source: &Path, dest: &Path, minify: bool) -> PacksmithResult<()> {
    let compact = minify && !is_manifest(dest);
    let is_json = source
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    if is_relaxed_json(source) || (minify && is_json) {
        let text = fs::read_to_string(source).map_err(|e| PacksmithError::io_at(source, e))?;
        let value = parse_relaxed(source, &text)?;
        let bytes = if compact {
            serde_json::to_vec(&value)?
        } else {
            serde_json::to_vec_pretty(&value)?
        };
        return atomic_write(dest, &bytes);
    }

    let bytes = fs::read(source).map_err(|e| PacksmithError::io_at(source, e))?;
    atomic_write(dest, &bytes)
}

/// Parse JSON5/JSONC (comments, trailing commas, unquoted keys)
pub(crate) fn parse_relaxed(file: &Path, text: &str) -> PacksmithResult<serde_json::Value> {
    json5::from_str::<serde_json::Value>(text).map_err(|e| PacksmithError::RelaxedJson {
        file: file.to_path_buf(),
        message: e.to_string(),
    })
}

fn is_manifest(dest: &Path) -> bool {
    dest.file_name().is_some_and(|name| name == MANIFEST_FILE)
}

//! Zip archive writer
//!
//! Each source directory becomes a top-level folder in the archive
//! (`behavior_pack/`, `resource_pack/`). Files that vanish between listing
//! and reading are reported as warnings; any other stream error fails the
//! archive.

use std::fs::{self, File};
use std::io::{self, BufWriter, Seek, Write};
use std::path::{Component, Path};

use tracing::debug;
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::application::cancel::CancellationToken;
use crate::domain::ports::{ArchiveReport, ArchiveSource, Archiver};
use crate::error::{PacksmithError, PacksmithResult};

/// Deflate level used for every entry
pub const COMPRESSION_LEVEL: i64 = 9;

#[derive(Debug, Clone, Copy, Default)]
pub struct ZipArchiver;

impl ZipArchiver {
    pub fn new() -> Self {
        Self
    }
}

impl Archiver for ZipArchiver {
    fn create_archive(
        &self,
        sources: &[ArchiveSource],
        out_file: &Path,
        token: &CancellationToken,
    ) -> PacksmithResult<ArchiveReport> {
        token.check()?;
        if let Some(parent) = out_file.parent() {
            fs::create_dir_all(parent).map_err(|e| PacksmithError::io_at(parent, e))?;
        }
        let file = File::create(out_file).map_err(|e| PacksmithError::io_at(out_file, e))?;

        // the writer is dropped before the partial file is removed
        let result = write_archive(BufWriter::new(file), sources, token);
        if result.is_err() {
            let _ = fs::remove_file(out_file);
        }
        result
    }
}

fn write_archive<W: Write + Seek>(
    writer: W,
    sources: &[ArchiveSource],
    token: &CancellationToken,
) -> PacksmithResult<ArchiveReport> {
    let mut zip = ZipWriter::new(writer);
    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .compression_level(Some(COMPRESSION_LEVEL));
    let mut report = ArchiveReport::default();

    for source in sources {
        if !source.dir.is_dir() {
            report.warnings.push(format!(
                "{} does not exist, {} left out of the archive",
                source.dir.display(),
                source.root_name
            ));
            continue;
        }
        zip.add_directory(format!("{}/", source.root_name), options)?;

        for entry in WalkDir::new(&source.dir).min_depth(1).sort_by_file_name() {
            token.check()?;

            let entry = match entry {
                Ok(entry) => entry,
                Err(e) if is_not_found(e.io_error()) => {
                    report.warnings.push(format!("vanished while archiving: {e}"));
                    continue;
                }
                Err(e) => {
                    let path = e.path().map(Path::to_path_buf).unwrap_or_default();
                    return Err(PacksmithError::io_at(path, e.into()));
                }
            };
            let Ok(rel) = entry.path().strip_prefix(&source.dir) else {
                continue;
            };
            let name = entry_name(&source.root_name, rel);

            if entry.file_type().is_dir() {
                zip.add_directory(format!("{name}/"), options)?;
                continue;
            }

            let mut file = match File::open(entry.path()) {
                Ok(file) => file,
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    report
                        .warnings
                        .push(format!("vanished while archiving: {}", entry.path().display()));
                    continue;
                }
                Err(e) => return Err(PacksmithError::io_at(entry.path(), e)),
            };

            zip.start_file(name, options)?;
            report.bytes +=
                io::copy(&mut file, &mut zip).map_err(|e| PacksmithError::io_at(entry.path(), e))?;
            report.entries += 1;
        }
    }

    let mut writer = zip.finish()?;
    writer.flush()?;
    debug!(entries = report.entries, bytes = report.bytes, "archive finished");
    Ok(report)
}

fn is_not_found(error: Option<&io::Error>) -> bool {
    error.is_some_and(|e| e.kind() == io::ErrorKind::NotFound)
}

/// Archive entry name with `/` separators regardless of platform
fn entry_name(root: &str, rel: &Path) -> String {
    let mut name = root.to_string();
    for component in rel.components() {
        if let Component::Normal(part) = component {
            name.push('/');
            name.push_str(&part.to_string_lossy());
        }
    }
    name
}

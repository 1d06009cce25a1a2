//! esbuild process adapter
//!
//! Runs the `esbuild` binary as a child process. The child is polled rather
//! than waited on so cancellation can kill it mid-build.

use std::ffi::OsString;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::thread::JoinHandle;
use std::time::Duration;

use tracing::{debug, warn};

use crate::application::cancel::CancellationToken;
use crate::domain::ports::{BundleReport, BundleRequest, ScriptBundler};
use crate::error::{PacksmithError, PacksmithResult};

/// Overrides the esbuild executable
pub const ESBUILD_ENV: &str = "PACKSMITH_ESBUILD";

const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Error lines kept in the failure message
const MAX_REPORTED_ERRORS: usize = 5;

#[derive(Debug, Clone)]
pub struct EsbuildBundler {
    program: OsString,
}

impl Default for EsbuildBundler {
    fn default() -> Self {
        Self::new()
    }
}

impl EsbuildBundler {
    /// Use `$PACKSMITH_ESBUILD`, falling back to `esbuild` on `PATH`
    pub fn new() -> Self {
        let program = std::env::var_os(ESBUILD_ENV)
            .filter(|p| !p.is_empty())
            .unwrap_or_else(|| OsString::from("esbuild"));
        Self { program }
    }

    pub fn with_program(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &OsString {
        &self.program
    }

    /// Command-line arguments for `request`
    pub fn args(&self, request: &BundleRequest) -> Vec<OsString> {
        let mut args: Vec<OsString> = [
            "--format=esm",
            "--platform=neutral",
            "--target=es2023",
            "--charset=utf8",
            "--log-level=warning",
        ]
        .into_iter()
        .map(OsString::from)
        .collect();

        if request.bundle {
            let stem = request
                .entry
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "main".to_string());
            args.push(request.entry.clone().into_os_string());
            args.push("--bundle".into());
            // provided by the game at runtime
            args.push("--external:@minecraft/*".into());
            args.push(flag("--outfile=", &request.out_dir.join(format!("{stem}.js"))));
        } else {
            let base = entry_dir(&request.entry);
            if request.sources.is_empty() {
                args.push(request.entry.clone().into_os_string());
            } else {
                args.extend(request.sources.iter().map(|s| s.clone().into_os_string()));
            }
            args.push(flag("--outdir=", &request.out_dir));
            args.push(flag("--outbase=", base));
        }

        if request.minify {
            args.push("--minify".into());
        }
        if request.source_map {
            args.push("--sourcemap=linked".into());
        }
        if let Some(tsconfig) = &request.tsconfig {
            args.push(flag("--tsconfig=", tsconfig));
        }

        args
    }

    fn spawn(&self, request: &BundleRequest) -> PacksmithResult<Child> {
        let args = self.args(request);
        debug!(program = ?self.program, ?args, "spawning bundler");

        Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| PacksmithError::BundlerSpawn {
                program: self.program.to_string_lossy().into_owned(),
                source,
            })
    }
}

impl ScriptBundler for EsbuildBundler {
    fn bundle(
        &self,
        request: &BundleRequest,
        token: &CancellationToken,
    ) -> PacksmithResult<BundleReport> {
        token.check()?;
        let mut child = self.spawn(request)?;
        let reader = child.stderr.take().map(collect_lines);

        let status = loop {
            if token.is_cancelled() {
                if let Err(e) = child.kill() {
                    warn!("failed to kill bundler: {e}");
                }
                let _ = child.wait();
                return Err(PacksmithError::Cancelled);
            }
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) => {
                    token.wait_timeout(POLL_INTERVAL);
                }
                Err(e) => {
                    let _ = child.kill();
                    return Err(PacksmithError::io_at(&request.entry, e));
                }
            }
        };

        let lines = reader
            .map(|handle| handle.join().unwrap_or_default())
            .unwrap_or_default();
        for line in &lines {
            debug!(target: "packsmith::esbuild", "{line}");
        }

        let mut report = count_diagnostics(&lines);
        if !status.success() && report.errors == 0 {
            report.errors = 1;
        }
        if report.warnings > 0 {
            warn!("esbuild reported {} warning(s)", report.warnings);
        }
        if report.errors > 0 {
            return Err(PacksmithError::Bundle {
                errors: report.errors,
                message: error_summary(&lines, status.code()),
            });
        }

        Ok(report)
    }
}

fn collect_lines(stderr: impl std::io::Read + Send + 'static) -> JoinHandle<Vec<String>> {
    std::thread::spawn(move || {
        BufReader::new(stderr)
            .lines()
            .map_while(Result::ok)
            .collect()
    })
}

/// Count esbuild's `[ERROR]` and `[WARNING]` markers
pub(crate) fn count_diagnostics(lines: &[String]) -> BundleReport {
    let mut report = BundleReport::default();
    for line in lines {
        if line.contains("[ERROR]") {
            report.errors += 1;
        } else if line.contains("[WARNING]") {
            report.warnings += 1;
        }
    }
    report
}

fn error_summary(lines: &[String], code: Option<i32>) -> String {
    let errors: Vec<&str> = lines
        .iter()
        .filter(|line| line.contains("[ERROR]"))
        .take(MAX_REPORTED_ERRORS)
        .map(|line| line.trim())
        .collect();

    if errors.is_empty() {
        match code {
            Some(code) => format!("esbuild exited with status {code}"),
            None => "esbuild was terminated by a signal".to_string(),
        }
    } else {
        errors.join("; ")
    }
}

fn entry_dir(entry: &Path) -> &Path {
    entry.parent().unwrap_or_else(|| Path::new("."))
}

fn flag(prefix: &str, path: &Path) -> OsString {
    let mut flag = OsString::from(prefix);
    flag.push(path.as_os_str());
    flag
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::fs;
    use tempfile::tempdir;

    fn request(entry: PathBuf, out_dir: PathBuf) -> BundleRequest {
        BundleRequest {
            entry,
            out_dir,
            sources: Vec::new(),
            bundle: true,
            minify: false,
            source_map: false,
            tsconfig: None,
        }
    }

    fn strings(args: Vec<OsString>) -> Vec<String> {
        args.into_iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn bundle_args_write_single_file_named_after_entry() {
        let mut req = request(PathBuf::from("/src/scripts/main.ts"), PathBuf::from("/out/scripts"));
        req.minify = true;
        req.source_map = true;
        req.tsconfig = Some(PathBuf::from("/src/tsconfig.json"));

        let args = strings(EsbuildBundler::with_program("esbuild").args(&req));
        assert_eq!(
            args,
            vec![
                "--format=esm",
                "--platform=neutral",
                "--target=es2023",
                "--charset=utf8",
                "--log-level=warning",
                "/src/scripts/main.ts",
                "--bundle",
                "--external:@minecraft/*",
                "--outfile=/out/scripts/main.js",
                "--minify",
                "--sourcemap=linked",
                "--tsconfig=/src/tsconfig.json",
            ]
        );
    }

    #[test]
    fn transpile_args_list_the_requested_sources() {
        let scripts = PathBuf::from("/src/scripts");
        let mut req = request(scripts.join("main.ts"), PathBuf::from("/out/scripts"));
        req.bundle = false;
        req.sources = vec![scripts.join("lib/util.js"), scripts.join("main.ts")];

        let args = strings(EsbuildBundler::with_program("esbuild").args(&req));

        assert!(!args.iter().any(|a| a == "--bundle"));
        assert!(!args.iter().any(|a| a.starts_with("--external")));
        assert_eq!(
            &args[5..],
            [
                "/src/scripts/lib/util.js",
                "/src/scripts/main.ts",
                "--outdir=/out/scripts",
                "--outbase=/src/scripts",
            ]
        );
    }

    #[test]
    fn transpile_without_sources_falls_back_to_entry() {
        let mut req = request(PathBuf::from("/src/scripts/main.ts"), PathBuf::from("/out/scripts"));
        req.bundle = false;

        let args = strings(EsbuildBundler::with_program("esbuild").args(&req));
        assert!(args.contains(&"/src/scripts/main.ts".to_string()));
    }

    #[test]
    fn diagnostics_are_counted_from_markers() {
        let lines: Vec<String> = [
            "✘ [ERROR] Could not resolve \"./missing\"",
            "    scripts/main.ts:1:7:",
            "▲ [WARNING] Duplicate key \"a\" in object literal",
            "✘ [ERROR] Expected \";\" but found \"}\"",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();

        assert_eq!(
            count_diagnostics(&lines),
            BundleReport {
                errors: 2,
                warnings: 1
            }
        );
        assert_eq!(
            error_summary(&lines, Some(1)),
            "✘ [ERROR] Could not resolve \"./missing\"; ✘ [ERROR] Expected \";\" but found \"}\""
        );
    }

    #[test]
    fn exit_status_is_reported_without_error_lines() {
        assert_eq!(error_summary(&[], Some(2)), "esbuild exited with status 2");
    }

    #[test]
    fn missing_program_is_a_spawn_error() {
        let dir = tempdir().unwrap();
        let bundler = EsbuildBundler::with_program(dir.path().join("no-such-esbuild"));
        let req = request(dir.path().join("main.ts"), dir.path().join("out"));

        let err = bundler.bundle(&req, &CancellationToken::new()).unwrap_err();
        assert!(matches!(err, PacksmithError::BundlerSpawn { .. }));
    }

    #[test]
    fn cancelled_token_skips_spawn() {
        let dir = tempdir().unwrap();
        let bundler = EsbuildBundler::with_program(dir.path().join("no-such-esbuild"));
        let req = request(dir.path().join("main.ts"), dir.path().join("out"));
        let token = CancellationToken::new();
        token.cancel();

        assert!(bundler.bundle(&req, &token).unwrap_err().is_cancelled());
    }

    #[cfg(unix)]
    #[test]
    fn long_running_child_is_killed_on_cancel() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let script = dir.path().join("fake-esbuild");
        fs::write(&script, "#!/bin/sh\nexec sleep 30\n").unwrap();
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();

        let bundler = EsbuildBundler::with_program(&script);
        let token = CancellationToken::new();
        let trigger = token.clone();
        let canceller = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(100));
            trigger.cancel();
        });

        let started = std::time::Instant::now();
        let req = request(dir.path().join("main.ts"), dir.path().join("out"));
        let err = bundler.bundle(&req, &token).unwrap_err();

        assert!(err.is_cancelled());
        assert!(started.elapsed() < Duration::from_secs(10));
        canceller.join().unwrap();
    }
}

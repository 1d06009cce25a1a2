//! Shared helpers for packsmith CLI tests.
//!
//! `Project` owns a temp directory holding a `packsmith.toml` and the pack
//! sources, and runs the built binary inside it.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::TempDir;

/// Result of one CLI invocation
#[derive(Debug)]
pub struct RunResult {
    pub success: bool,
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl From<Output> for RunResult {
    fn from(output: Output) -> Self {
        Self {
            success: output.status.success(),
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        }
    }
}

pub struct Project {
    pub root: TempDir,
}

impl Project {
    pub fn new() -> Self {
        Self {
            root: tempfile::tempdir().unwrap(),
        }
    }

    pub fn path(&self, rel: &str) -> PathBuf {
        self.root.path().join(rel)
    }

    pub fn write(&self, rel: &str, content: &str) -> &Self {
        let path = self.path(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
        self
    }

    pub fn read(&self, rel: &str) -> String {
        fs::read_to_string(self.path(rel))
            .unwrap_or_else(|e| panic!("cannot read {rel}: {e}"))
    }

    pub fn exists(&self, rel: &str) -> bool {
        self.path(rel).exists()
    }

    pub fn run(&self, args: &[&str]) -> RunResult {
        self.run_with_env(args, &[])
    }

    pub fn run_with_env(&self, args: &[&str], env: &[(&str, &str)]) -> RunResult {
        run_in(self.root.path(), args, env)
    }
}

pub fn run_in(cwd: &Path, args: &[&str], env: &[(&str, &str)]) -> RunResult {
    let mut command = Command::new(env!("CARGO_BIN_EXE_packsmith"));
    command
        .current_dir(cwd)
        .args(args)
        .env_remove("RUST_LOG")
        .env_remove("PACKSMITH_LOG_LEVEL")
        .env_remove("PACKSMITH_WATCH")
        .env("NO_COLOR", "1");
    for (key, value) in env {
        command.env(key, value);
    }
    command.output().unwrap().into()
}

/// Minimal two-pack config without scripts
pub const TWO_PACKS: &str = r#"
[behavior_pack]
src_dir = "src/bp"
out_dir = "dist/bp"
manifest = { format_version = 2, header = { name = "Example BP" } }

[resource_pack]
src_dir = "src/rp"
out_dir = "dist/rp"
generate_texture_list = true

[[archives]]
out_file = "dist/example.mcaddon"
"#;

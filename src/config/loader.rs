//! Configuration loading

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{PacksmithError, PacksmithResult};

use super::types::{BuildConfig, CommonPackConfig, LogLevel};

/// Config file looked up in the working directory when `--config` is absent
pub const DEFAULT_CONFIG_FILE: &str = "packsmith.toml";

/// Non-fatal configuration warning surfaced to CLI users.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigWarning {
    /// Dotted path of the unknown key (e.g. `behavior_pack.src_dri`), or the
    /// name of the rejected environment variable
    pub key: String,
    /// Config file the key was found in; `None` for environment variables
    pub file: Option<PathBuf>,
    /// 1-indexed line, when the key could be located
    pub line: Option<usize>,
    pub suggestion: Option<String>,
    /// Why a value was ignored; `None` for unknown keys
    pub problem: Option<String>,
}

impl ConfigWarning {
    fn ignored_env(var: &str, problem: impl Into<String>) -> Self {
        Self {
            key: var.to_string(),
            file: None,
            line: None,
            suggestion: None,
            problem: Some(problem.into()),
        }
    }
}

impl std::fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(problem) = &self.problem {
            return write!(f, "ignoring {}: {problem}", self.key);
        }
        write!(f, "unknown key '{}'", self.key)?;
        if let Some(file) = &self.file {
            write!(f, " in {}", file.display())?;
        }
        if let Some(line) = self.line {
            write!(f, ":{line}")?;
        }
        if let Some(suggestion) = &self.suggestion {
            write!(f, " (did you mean '{suggestion}'?)")?;
        }
        Ok(())
    }
}

const COMMON_PACK_KEYS: &[&str] = &[
    "src_dir",
    "out_dir",
    "manifest",
    "include",
    "exclude",
    "target_dirs",
    "minify",
];

const SCRIPT_KEYS: &[&str] = &["entry", "bundle", "minify", "source_map", "tsconfig"];

/// Load configuration and collect non-fatal warnings (e.g. unknown keys).
///
/// Relative paths are resolved against the directory holding `path`.
pub fn load_with_warnings(path: &Path) -> PacksmithResult<(BuildConfig, Vec<ConfigWarning>)> {
    let content = fs::read_to_string(path).map_err(|e| PacksmithError::io_at(path, e))?;

    let mut unknown_paths: Vec<String> = Vec::new();
    let deserializer = toml::de::Deserializer::new(&content);

    let config: BuildConfig = serde_ignored::deserialize(deserializer, |p| {
        unknown_paths.push(p.to_string());
    })
    .map_err(|e| PacksmithError::InvalidConfig {
        file: path.to_path_buf(),
        message: e.to_string(),
    })?;

    // Pack sections are flattened, so serde_ignored never sees their leftovers
    if let Ok(raw) = content.parse::<toml::Table>() {
        unknown_paths.extend(unknown_pack_keys(&raw));
    }

    let mut seen = BTreeSet::new();
    let warnings = unknown_paths
        .into_iter()
        .filter(|p| seen.insert(p.clone()))
        .map(|path_str| {
            let leaf = path_str
                .split('.')
                .next_back()
                .unwrap_or(path_str.as_str())
                .to_string();
            ConfigWarning {
                line: find_line_number(&content, &leaf),
                suggestion: suggest_key(&leaf),
                key: path_str,
                file: Some(path.to_path_buf()),
                problem: None,
            }
        })
        .collect();

    let base = path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));

    Ok((resolve_paths(config, &base), warnings))
}

/// Load the config file, or `packsmith.toml` in `cwd` when none is given.
pub fn load_from(explicit: Option<&Path>, cwd: &Path) -> PacksmithResult<(BuildConfig, Vec<ConfigWarning>)> {
    let path = match explicit {
        Some(p) if p.is_absolute() => p.to_path_buf(),
        Some(p) => cwd.join(p),
        None => cwd.join(DEFAULT_CONFIG_FILE),
    };
    load_with_warnings(&path)
}

/// Apply environment variable overrides (PACKSMITH_* prefix).
///
/// Rejected values come back as warnings; logging is usually not set up yet
/// when this runs.
pub fn with_env_overrides(config: BuildConfig) -> (BuildConfig, Vec<ConfigWarning>) {
    with_env_overrides_from(config, |key| std::env::var(key).ok())
}

/// Same as [`with_env_overrides`], reading variables through `lookup`
pub fn with_env_overrides_from(
    mut config: BuildConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> (BuildConfig, Vec<ConfigWarning>) {
    let mut warnings = Vec::new();

    // PACKSMITH_LOG_LEVEL
    if let Some(level) = lookup("PACKSMITH_LOG_LEVEL") {
        match level.parse::<LogLevel>() {
            Ok(level) => config.log_level = level,
            Err(e) => warnings.push(ConfigWarning::ignored_env("PACKSMITH_LOG_LEVEL", e)),
        }
    }

    // PACKSMITH_WATCH
    if let Some(val) = lookup("PACKSMITH_WATCH") {
        config.watch = matches!(val.trim().to_lowercase().as_str(), "1" | "true" | "yes");
    }

    (config, warnings)
}

fn unknown_pack_keys(raw: &toml::Table) -> Vec<String> {
    let mut unknown = Vec::new();

    for (section, extra) in [
        ("behavior_pack", "scripts"),
        ("resource_pack", "generate_texture_list"),
    ] {
        let Some(table) = raw.get(section).and_then(toml::Value::as_table) else {
            continue;
        };
        for key in table.keys() {
            if !COMMON_PACK_KEYS.contains(&key.as_str()) && key != extra {
                unknown.push(format!("{section}.{key}"));
            }
        }
        if let Some(scripts) = table.get("scripts").and_then(toml::Value::as_table) {
            if section == "behavior_pack" {
                for key in scripts.keys() {
                    if !SCRIPT_KEYS.contains(&key.as_str()) {
                        unknown.push(format!("{section}.scripts.{key}"));
                    }
                }
            }
        }
    }

    unknown
}

fn resolve_paths(mut config: BuildConfig, base: &Path) -> BuildConfig {
    if let Some(bp) = config.behavior_pack.as_mut() {
        resolve_common(&mut bp.common, base);
        if let Some(scripts) = bp.scripts.as_mut() {
            if let Some(tsconfig) = scripts.tsconfig.take() {
                scripts.tsconfig = Some(resolve(&tsconfig, base));
            }
        }
    }
    if let Some(rp) = config.resource_pack.as_mut() {
        resolve_common(&mut rp.common, base);
    }
    for archive in &mut config.archives {
        archive.out_file = resolve(&archive.out_file, base);
    }
    config
}

fn resolve_common(common: &mut CommonPackConfig, base: &Path) {
    common.src_dir = resolve(&common.src_dir, base);
    common.out_dir = resolve(&common.out_dir, base);
    common.target_dirs = common
        .target_dirs
        .iter()
        .map(|dir| resolve(dir, base))
        .collect();
}

/// Expand `~/` and anchor relative paths at `base`
pub fn resolve(path: &Path, base: &Path) -> PathBuf {
    if path.as_os_str().is_empty() {
        return PathBuf::new();
    }
    if let Ok(rest) = path.strip_prefix("~") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

fn find_line_number(content: &str, needle: &str) -> Option<usize> {
    content
        .lines()
        .position(|line| line.trim_start().starts_with(needle))
        .or_else(|| content.lines().position(|line| line.contains(needle)))
        .map(|i| i + 1)
}

fn suggest_key(unknown: &str) -> Option<String> {
    const CANDIDATES: &[&str] = &[
        "behavior_pack",
        "resource_pack",
        "src_dir",
        "out_dir",
        "manifest",
        "include",
        "exclude",
        "target_dirs",
        "minify",
        "scripts",
        "entry",
        "bundle",
        "source_map",
        "tsconfig",
        "generate_texture_list",
        "archives",
        "out_file",
        "watch",
        "log_level",
    ];

    let mut best: Option<(&str, usize)> = None;
    for candidate in CANDIDATES {
        let dist = levenshtein(unknown, candidate);
        best = match best {
            None => Some((candidate, dist)),
            Some((_, best_dist)) if dist < best_dist => Some((candidate, dist)),
            Some(current) => Some(current),
        };
    }

    match best {
        Some((candidate, dist)) if dist <= 2 => Some(candidate.to_string()),
        _ => None,
    }
}

fn levenshtein(a: &str, b: &str) -> usize {
    if a == b {
        return 0;
    }

    let b_bytes = b.as_bytes();
    let mut prev: Vec<usize> = (0..=b_bytes.len()).collect();
    let mut curr = vec![0usize; b_bytes.len() + 1];

    for (i, &ac) in a.as_bytes().iter().enumerate() {
        curr[0] = i + 1;
        for (j, &bc) in b_bytes.iter().enumerate() {
            let substitution = prev[j] + usize::from(ac != bc);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(substitution);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b_bytes.len()]
}

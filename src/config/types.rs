//! Configuration type definitions

use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::value_objects::PackKind;
use crate::error::{PacksmithError, PacksmithResult};

/// Minimum level of log output
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    #[default]
    Info,
    Warn,
    Error,
    /// Suppress all output
    Silent,
}

impl LogLevel {
    /// Directive understood by `tracing_subscriber::EnvFilter`
    pub fn as_directive(self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
            LogLevel::Silent => "off",
        }
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            "silent" | "off" => Ok(LogLevel::Silent),
            other => Err(format!("unknown log level '{other}'")),
        }
    }
}

/// Settings shared by both pack kinds
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CommonPackConfig {
    /// Source directory of the pack
    pub src_dir: PathBuf,

    /// Output directory of the compiled pack
    pub out_dir: PathBuf,

    /// Content of `manifest.json`, emitted on every cycle when present
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manifest: Option<serde_json::Value>,

    /// Globs of files to include; empty means everything
    #[serde(default)]
    pub include: Vec<String>,

    /// Globs of files to exclude; takes precedence over `include`
    #[serde(default)]
    pub exclude: Vec<String>,

    /// Extra locations that receive a copy of the compiled pack
    #[serde(default)]
    pub target_dirs: Vec<PathBuf>,

    /// Write compact JSON (manifest.json stays pretty)
    #[serde(default)]
    pub minify: bool,
}

/// Script bundling settings of a behavior pack
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct ScriptConfig {
    /// Entry point of the scripts, TypeScript allowed
    pub entry: PathBuf,

    /// Bundle everything into a single file named after the entry
    #[serde(default)]
    pub bundle: bool,

    #[serde(default)]
    pub minify: bool,

    /// Emit linked source maps
    #[serde(default)]
    pub source_map: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tsconfig: Option<PathBuf>,
}

/// Behavior pack configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct BehaviorPackConfig {
    #[serde(flatten)]
    pub common: CommonPackConfig,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scripts: Option<ScriptConfig>,
}

/// Resource pack configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ResourcePackConfig {
    #[serde(flatten)]
    pub common: CommonPackConfig,

    /// Maintain `textures/texture_list.json`
    #[serde(default)]
    pub generate_texture_list: bool,
}

/// One pack, tagged by kind
#[derive(Debug, Clone)]
pub enum PackConfig {
    Behavior(BehaviorPackConfig),
    Resource(ResourcePackConfig),
}

impl PackConfig {
    pub fn kind(&self) -> PackKind {
        match self {
            PackConfig::Behavior(_) => PackKind::Behavior,
            PackConfig::Resource(_) => PackKind::Resource,
        }
    }

    pub fn common(&self) -> &CommonPackConfig {
        match self {
            PackConfig::Behavior(bp) => &bp.common,
            PackConfig::Resource(rp) => &rp.common,
        }
    }

    /// Script settings, only ever present on behavior packs
    pub fn scripts(&self) -> Option<&ScriptConfig> {
        match self {
            PackConfig::Behavior(bp) => bp.scripts.as_ref(),
            PackConfig::Resource(_) => None,
        }
    }

    /// Whether texture assets trigger `texture_list.json` regeneration
    pub fn generates_texture_list(&self) -> bool {
        match self {
            PackConfig::Behavior(_) => false,
            PackConfig::Resource(rp) => rp.generate_texture_list,
        }
    }

    pub fn src_dir(&self) -> &Path {
        &self.common().src_dir
    }

    pub fn out_dir(&self) -> &Path {
        &self.common().out_dir
    }
}

/// Output archive
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ArchiveConfig {
    /// Where the archive file is written
    pub out_file: PathBuf,
}

/// Root configuration (`packsmith.toml`)
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct BuildConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub behavior_pack: Option<BehaviorPackConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_pack: Option<ResourcePackConfig>,

    #[serde(default)]
    pub archives: Vec<ArchiveConfig>,

    /// Keep running and rebuild on file changes
    #[serde(default)]
    pub watch: bool,

    #[serde(default)]
    pub log_level: LogLevel,
}

impl BuildConfig {
    /// Load configuration from a TOML file, discarding warnings
    pub fn load(path: &Path) -> PacksmithResult<Self> {
        super::loader::load_with_warnings(path).map(|(config, _)| config)
    }

    /// Enabled packs, behavior pack first
    pub fn packs(&self) -> Vec<PackConfig> {
        let mut packs = Vec::with_capacity(2);
        if let Some(bp) = &self.behavior_pack {
            packs.push(PackConfig::Behavior(bp.clone()));
        }
        if let Some(rp) = &self.resource_pack {
            packs.push(PackConfig::Resource(rp.clone()));
        }
        packs
    }

    /// Reject configurations that cannot start a build
    pub fn validate(&self) -> PacksmithResult<()> {
        let packs = self.packs();
        if packs.is_empty() {
            return Err(PacksmithError::NoPacksConfigured);
        }

        for pack in &packs {
            let common = pack.common();
            if common.src_dir.as_os_str().is_empty() || common.out_dir.as_os_str().is_empty() {
                return Err(PacksmithError::InvalidConfig {
                    file: PathBuf::from(pack.kind().label()),
                    message: "src_dir and out_dir are required".to_string(),
                });
            }
            if let Some(manifest) = &common.manifest {
                if !manifest.is_object() {
                    return Err(PacksmithError::InvalidConfig {
                        file: PathBuf::from(pack.kind().label()),
                        message: "manifest must be a table".to_string(),
                    });
                }
            }
        }

        Ok(())
    }
}

//! Configuration module for Packsmith
//!
//! Precedence, highest first:
//! 1. CLI flags (`--watch`, `--log-level`)
//! 2. Environment variables (PACKSMITH_*)
//! 3. The config file (`packsmith.toml` or `--config`)
//! 4. Built-in defaults

mod loader;
mod types;

pub use loader::{
    load_from, load_with_warnings, resolve, with_env_overrides, with_env_overrides_from,
    ConfigWarning, DEFAULT_CONFIG_FILE,
};
pub use types::{
    ArchiveConfig, BehaviorPackConfig, BuildConfig, CommonPackConfig, LogLevel, PackConfig,
    ResourcePackConfig, ScriptConfig,
};

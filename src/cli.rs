use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use packsmith::config::LogLevel;

/// Packsmith - incremental builder for behavior and resource packs
#[derive(Parser, Debug)]
#[command(name = "packsmith")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Compile the configured packs, optionally watching for changes
    Build(BuildArgs),

    /// Shorthand for `build --watch`
    Watch(WatchArgs),
}

#[derive(Args, Debug, Clone, Default)]
pub struct WatchArgs {
    /// Path to the config file (default: ./packsmith.toml)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Minimum level of log output
    #[arg(long, value_enum)]
    pub log_level: Option<LogLevel>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct BuildArgs {
    #[command(flatten)]
    pub common: WatchArgs,

    /// Keep running and rebuild when sources change
    #[arg(short, long)]
    pub watch: bool,
}

impl Commands {
    /// Normalise both subcommands to build arguments
    pub fn into_build_args(self) -> BuildArgs {
        match self {
            Commands::Build(args) => args,
            Commands::Watch(common) => BuildArgs {
                common,
                watch: true,
            },
        }
    }
}

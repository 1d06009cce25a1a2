//! Packsmith CLI - incremental builder for behavior and resource packs
//!
//! Usage: packsmith <COMMAND>
//!
//! Commands:
//!   build   Compile the configured packs (`--watch` keeps rebuilding)
//!   watch   Shorthand for `build --watch`

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;

mod cli;
mod commands;

use cli::Cli;

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    commands::build::cmd_build(cli.command.into_build_args())
}

use std::process::ExitCode;

use anyhow::{Context, Result};
use tracing::{info, warn};

use packsmith::application::{BuildUseCase, CancellationToken};
use packsmith::config::{self, BuildConfig};
use packsmith::infrastructure::{logging, EsbuildBundler, ZipArchiver};

use crate::cli::BuildArgs;

/// Load the config with every override applied, highest priority last
fn load_config(args: &BuildArgs) -> Result<(BuildConfig, Vec<config::ConfigWarning>)> {
    let cwd = std::env::current_dir().context("cannot determine the working directory")?;
    let (loaded, mut warnings) = config::load_from(args.common.config.as_deref(), &cwd)?;
    let (mut config, env_warnings) = config::with_env_overrides(loaded);
    warnings.extend(env_warnings);

    if args.watch {
        config.watch = true;
    }
    if let Some(level) = args.common.log_level {
        config.log_level = level;
    }

    Ok((config, warnings))
}

pub fn cmd_build(args: BuildArgs) -> Result<ExitCode> {
    let (config, warnings) = load_config(&args)?;
    logging::init(config.log_level);
    for warning in &warnings {
        warn!("{warning}");
    }

    let token = CancellationToken::new();
    let handler_token = token.clone();
    ctrlc::set_handler(move || handler_token.cancel())
        .context("failed to install the Ctrl+C handler")?;

    let watch = config.watch;
    let use_case = BuildUseCase::new(config, EsbuildBundler::new(), ZipArchiver::new(), token);
    let summary = use_case.build()?;

    if summary.cancelled {
        info!("Stopped");
        return Ok(ExitCode::SUCCESS);
    }
    if !watch && summary.has_failures() {
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}

//! Log output
//!
//! Events go to stderr through `tracing_subscriber::fmt`. The configured
//! [`LogLevel`] is the default filter; `RUST_LOG` replaces it when set.

use is_terminal::IsTerminal;
use tracing_subscriber::EnvFilter;

use crate::config::LogLevel;

/// Filter for `level`, unless `RUST_LOG` carries a valid directive
pub fn filter_for(level: LogLevel) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_directive()))
}

/// Install the global subscriber. A second call is a no-op.
pub fn init(level: LogLevel) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter_for(level))
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(false)
        .try_init();
}

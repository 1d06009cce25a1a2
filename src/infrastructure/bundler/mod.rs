//! Script bundler adapters

mod esbuild;

pub use esbuild::{EsbuildBundler, ESBUILD_ENV};

//! Script bundler port

use std::path::PathBuf;

use crate::application::cancel::CancellationToken;
use crate::error::PacksmithResult;

/// One bundling job for a behavior pack's scripts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleRequest {
    /// Absolute path of the entry script
    pub entry: PathBuf,
    /// Directory receiving the emitted JavaScript (`<out_dir>/scripts`)
    pub out_dir: PathBuf,
    /// Included script files under the entry's directory, sorted. Transpiled
    /// one by one when `bundle` is off.
    pub sources: Vec<PathBuf>,
    pub bundle: bool,
    pub minify: bool,
    pub source_map: bool,
    pub tsconfig: Option<PathBuf>,
}

/// Diagnostics reported by a finished bundler run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BundleReport {
    pub errors: usize,
    pub warnings: usize,
}

/// Compiles a pack's scripts into its output tree.
///
/// Implementations must return `Err(Cancelled)` promptly once `token` fires.
pub trait ScriptBundler: Send + Sync {
    fn bundle(
        &self,
        request: &BundleRequest,
        token: &CancellationToken,
    ) -> PacksmithResult<BundleReport>;
}

impl<T: ScriptBundler + ?Sized> ScriptBundler for &T {
    fn bundle(
        &self,
        request: &BundleRequest,
        token: &CancellationToken,
    ) -> PacksmithResult<BundleReport> {
        (**self).bundle(request, token)
    }
}

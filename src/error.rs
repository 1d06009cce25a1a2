//! Error types for Packsmith
//!
//! Library code returns `PacksmithError`; the binary wraps it in `anyhow`.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for Packsmith operations
pub type PacksmithResult<T> = Result<T, PacksmithError>;

/// Main error type for Packsmith operations
#[derive(Error, Debug)]
pub enum PacksmithError {
    /// Neither pack is configured
    #[error("neither behavior_pack nor resource_pack is configured")]
    NoPacksConfigured,

    /// Configuration file could not be parsed or is semantically invalid
    #[error("invalid configuration in {file}: {message}")]
    InvalidConfig { file: PathBuf, message: String },

    /// An include/exclude glob failed to compile
    #[error("invalid pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },

    /// The pack's source directory is missing or unreadable
    #[error("source directory not found: {path}")]
    SourceDirNotFound { path: PathBuf },

    /// IO error bound to a specific path
    #[error("IO error at {path}: {source}")]
    FileIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A relaxed-JSON source could not be parsed
    #[error("invalid JSON in {file}: {message}")]
    RelaxedJson { file: PathBuf, message: String },

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Two sources would be written to the same output file
    #[error("{first} and {second} both compile to {output}")]
    OutputCollision {
        output: PathBuf,
        first: PathBuf,
        second: PathBuf,
    },

    /// The bundler could not be started
    #[error("failed to start bundler '{program}': {source}")]
    BundlerSpawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The bundler ran but reported errors
    #[error("script bundling failed with {errors} error(s): {message}")]
    Bundle { errors: usize, message: String },

    /// Archive stream error
    #[error("archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// File watcher error
    #[error("file watcher error: {0}")]
    Watch(#[from] notify::Error),

    /// A worker thread panicked
    #[error("worker panicked: {0}")]
    WorkerPanicked(String),

    /// The operation observed the cancellation signal
    #[error("operation was aborted")]
    Cancelled,
}

impl PacksmithError {
    /// Wrap an IO error with the path it happened on
    pub fn io_at(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PacksmithError::FileIo {
            path: path.into(),
            source,
        }
    }

    /// Convert the payload of a panicked worker thread
    pub fn from_panic(payload: Box<dyn std::any::Any + Send>) -> Self {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_string());
        PacksmithError::WorkerPanicked(message)
    }

    /// Cancellation is an expected outcome, not a failure
    pub fn is_cancelled(&self) -> bool {
        matches!(self, PacksmithError::Cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_error_display_no_packs() {
        let err = PacksmithError::NoPacksConfigured;
        assert_eq!(
            err.to_string(),
            "neither behavior_pack nor resource_pack is configured"
        );
    }

    #[test]
    fn test_error_display_file_io() {
        let err = PacksmithError::io_at(
            PathBuf::from("bp/items/sword.json"),
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        assert_eq!(err.to_string(), "IO error at bp/items/sword.json: gone");
    }

    #[test]
    fn test_from_panic_keeps_message() {
        let payload = std::panic::catch_unwind(|| panic!("boom")).unwrap_err();
        let err = PacksmithError::from_panic(payload);
        assert_eq!(err.to_string(), "worker panicked: boom");
    }

    #[test]
    fn test_cancelled_is_distinguished() {
        assert!(PacksmithError::Cancelled.is_cancelled());
        assert!(!PacksmithError::NoPacksConfigured.is_cancelled());
    }
}

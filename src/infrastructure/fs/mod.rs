//! Filesystem adapters

mod local;
mod mirror;

pub use local::{atomic_write, remove_and_prune, remove_dir_if_exists};
pub use mirror::{mirror_dir, MirrorStats};

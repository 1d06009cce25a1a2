//! Domain Entities

mod file_change;
mod pack_cache;

pub use file_change::{ChangeKind, FileChange};
pub use pack_cache::{PackCache, Timestamp};

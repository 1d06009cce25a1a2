//! Domain Value Objects
//!
//! Immutable value types that represent pack build concepts.

mod asset_category;
mod output_path;
mod pack_filter;
mod pack_kind;

pub use asset_category::{AssetCategory, IMAGE_EXTENSIONS, SCRIPT_EXTENSIONS};
pub use output_path::{is_relaxed_json, OutputPaths, RELAXED_JSON_EXTENSIONS};
pub use pack_filter::PackFilter;
pub use pack_kind::PackKind;

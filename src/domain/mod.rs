//! Domain Layer
//!
//! Pack build concepts without I/O dependencies.
//!
//! ## Structure
//!
//! - `entities/` - Cache snapshots and file change events
//! - `value_objects/` - Pack kinds, include/exclude filters, path mapping
//! - `ports/` - Interfaces for the external bundler and archiver

pub mod entities;
pub mod ports;
pub mod value_objects;

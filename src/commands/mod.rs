//! Subcommand handlers

pub mod build;

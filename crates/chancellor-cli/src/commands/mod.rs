//! CLI command implementations

pub mod asset;

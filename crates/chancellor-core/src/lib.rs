//! Chancellor Core - Foundational types for the Chancellor engine
//!
//! This crate provides the types that every other Chancellor crate depends on:
//! - `ChancellorError` - The shared error enum
//! - `Result` - Alias over `ChancellorError`

mod error;

pub use error::{ChancellorError, Result};

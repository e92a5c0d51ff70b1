//! Command implementations.

pub mod completions;
pub mod migrate;
pub mod validate;
pub mod version;

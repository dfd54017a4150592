//! Configuration loader and schema types.
//!
//! This module exposes the configuration schema used to drive runtime
//! behavior and helpers to load configuration from disk.

mod load;
mod schema;

pub use load::{default_data_dir, default_state_dir, resolve_config_path};
pub use schema::*;

#[cfg(test)]
mod tests;

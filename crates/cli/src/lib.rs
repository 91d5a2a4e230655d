//! Settle CLI internals
//!
//! Shared by the `settle` binary and its tests:
//! - `system_config`: TOML configuration file handling
//! - `runner`: feeding a line stream through a debounced sink

pub mod runner;
pub mod system_config;

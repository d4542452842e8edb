//! Parsing and validation of `weft.toml` fabric-generation configuration files.
//!
//! This crate reads the configuration file and produces a strongly-typed
//! [`FabricConfig`] naming the device description, the configuration-memory
//! organization, and where generated artifacts are written.

#![warn(missing_docs)]

pub mod error;
pub mod loader;
pub mod types;

pub use error::ConfigError;
pub use loader::{load_config, load_config_from_str, CONFIG_FILE_NAME};
pub use types::*;

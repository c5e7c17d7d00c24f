//! Configuration module
//!
//! Handles loading and validating configuration from TOML files and environment variables.

pub mod loader;
pub mod types;

pub use loader::{load_config, load_config_from_str, upstream_url_from_docker_host};
pub use types::*;

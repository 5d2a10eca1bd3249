//! Infrastructure layer: cache backends and configuration loading.

pub mod cache;
pub mod config;
pub mod policy_file;

pub use config::{AuthConfig, ConfigError};
pub use policy_file::load_registry;

//! Persistent application configuration.
//!
//! Stored as pretty-printed JSON:
//! - Linux:   `~/.config/tuyatray/config.json`
//! - Windows: `%APPDATA%\tuyatray\config.json`
//!
//! Keys are camelCase so the configuration window can post the same object
//! it receives.

mod error;
mod store;

pub use error::ConfigError;
pub use store::{AppConfig, ConfigStore, config_path};

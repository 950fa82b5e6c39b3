// src/config/mod.rs

//! Configuration loading and validation.
//!
//! - `model.rs`: the TOML-backed data model and built-in defaults.
//! - `loader.rs`: reading a config file from disk.
//! - `validate.rs`: version table and time-limit sanity checks.

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{load_and_validate, load_from_path, load_or_default};
pub use model::{ConfigFile, ConfigSection, RawConfigFile, WorkloadGroup};
pub use validate::validate_config;

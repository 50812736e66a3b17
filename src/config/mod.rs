// src/config/mod.rs

//! Configuration loading and validation.
//!
//! - `model.rs` holds the TOML-backed raw model and the validated model.
//! - `loader.rs` reads files from disk.
//! - `validate.rs` turns a raw config into a validated one.
//! - `duration.rs` parses signed duration strings.

pub mod duration;
pub mod loader;
pub mod model;
pub mod validate;

pub use duration::{SignedDuration, parse_duration};
pub use loader::{default_config_path, load_and_validate, load_from_path, parse_and_validate};
pub use model::{
    ChecksSection, CheckpointConfig, ConfigFile, ExecutorConfig, ExecutorSection, ModuleConfig,
    ModuleSpec, RawConfigFile, WorkerSection,
};

// src/config/mod.rs

//! Configuration loading and validation for mountready.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk (`loader.rs`).
//! - Validate it into a ready-to-use [`LauncherConfig`] (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{default_config_path, load_and_validate, load_from_path};
pub use model::{LauncherConfig, LauncherSection, RawConfigFile};
pub use validate::validate_launcher_config;

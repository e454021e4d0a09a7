// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::model::{LauncherConfig, RawConfigFile};
use crate::errors::Result;

/// Load a configuration file from a given path and return the raw `RawConfigFile`.
///
/// This only performs TOML deserialization; it does **not** parse durations
/// or check descriptor numbers. Use [`load_and_validate`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let config: RawConfigFile = toml::from_str(&contents)?;

    Ok(config)
}

/// Load a configuration file from path and turn it into a [`LauncherConfig`].
///
/// - Reads TOML.
/// - Applies defaults (handled by `serde` + `Default` impls).
/// - Parses `ready_timeout` / `stop_grace`.
/// - Checks the status descriptor and variable name are usable.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<LauncherConfig> {
    let raw_config = load_from_path(&path)?;
    let config = LauncherConfig::try_from(raw_config)?;
    Ok(config)
}

/// Config file picked up when `--config` is not given and it exists.
pub fn default_config_path() -> PathBuf {
    PathBuf::from("Mountready.toml")
}

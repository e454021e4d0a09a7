// src/config/validate.rs

use crate::config::model::{LauncherConfig, RawConfigFile};
use crate::errors::{MountReadyError, Result};
use crate::types::parse_duration;

impl TryFrom<RawConfigFile> for LauncherConfig {
    type Error = MountReadyError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        let section = raw.launcher;

        let ready_timeout = section
            .ready_timeout
            .as_deref()
            .map(|s| {
                parse_duration(s).map_err(|e| {
                    MountReadyError::ConfigError(format!("[launcher].ready_timeout: {e}"))
                })
            })
            .transpose()?;

        let stop_grace = parse_duration(&section.stop_grace)
            .map_err(|e| MountReadyError::ConfigError(format!("[launcher].stop_grace: {e}")))?;

        let config = LauncherConfig {
            build_dir: section.build_dir,
            status_env: section.status_env,
            status_fd: section.status_fd,
            inherit_env: section.inherit_env,
            ready_timeout,
            stop_signal: section.stop_signal,
            stop_grace,
            env: raw.env,
        };

        validate_launcher_config(&config)?;
        Ok(config)
    }
}

/// Check the invariants every launch relies on.
///
/// Exposed separately so that values overridden after loading (e.g. from CLI
/// flags) can be re-checked.
pub fn validate_launcher_config(cfg: &LauncherConfig) -> Result<()> {
    validate_status_fd(cfg)?;
    validate_env_name(&cfg.status_env, "[launcher].status_env")?;
    for key in cfg.env.keys() {
        validate_env_name(key, "[env]")?;
    }
    if cfg.ready_timeout.is_some_and(|d| d.is_zero()) {
        return Err(MountReadyError::ConfigError(
            "[launcher].ready_timeout must be greater than zero".to_string(),
        ));
    }
    Ok(())
}

fn validate_status_fd(cfg: &LauncherConfig) -> Result<()> {
    // 0..=2 belong to stdin/stdout/stderr, which the launcher wires itself.
    if cfg.status_fd < 3 {
        return Err(MountReadyError::ConfigError(format!(
            "[launcher].status_fd must be >= 3 (got {})",
            cfg.status_fd
        )));
    }
    Ok(())
}

fn validate_env_name(name: &str, context: &str) -> Result<()> {
    if name.is_empty() || name.contains('=') || name.contains('\0') {
        return Err(MountReadyError::ConfigError(format!(
            "{context}: invalid environment variable name '{name}'"
        )));
    }
    Ok(())
}

// src/config/model.rs

use std::collections::BTreeMap;
use std::os::fd::RawFd;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::types::StopSignal;

/// Environment variable the child reads to find its status descriptor.
pub const DEFAULT_STATUS_ENV: &str = "STATUS_PIPE";

/// Descriptor number the status pipe is installed at in the child.
pub const DEFAULT_STATUS_FD: RawFd = 3;

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// [launcher]
/// build_dir = "/tmp/build"
/// status_env = "STATUS_PIPE"
/// status_fd = 3
/// ready_timeout = "30s"
/// stop_signal = "term"
/// stop_grace = "5s"
///
/// [env]
/// GOOGLE_APPLICATION_CREDENTIALS = "/etc/creds.json"
/// ```
///
/// All sections are optional and have reasonable defaults.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct RawConfigFile {
    /// How processes are launched and stopped, from `[launcher]`.
    #[serde(default)]
    pub launcher: LauncherSection,

    /// Environment overrides applied to every launch, from `[env]`.
    #[serde(default)]
    pub env: BTreeMap<String, String>,
}

/// `[launcher]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LauncherSection {
    /// Directory relative program paths are resolved against.
    #[serde(default)]
    pub build_dir: Option<PathBuf>,

    #[serde(default = "default_status_env")]
    pub status_env: String,

    #[serde(default = "default_status_fd")]
    pub status_fd: RawFd,

    /// Whether the child starts from a copy of our own environment.
    ///
    /// When `false` the child only sees `[env]`, request overrides and the
    /// status variable.
    #[serde(default = "default_inherit_env")]
    pub inherit_env: bool,

    /// Duration string (e.g. `"30s"`); unset means wait forever.
    #[serde(default)]
    pub ready_timeout: Option<String>,

    #[serde(default)]
    pub stop_signal: StopSignal,

    /// How long a stopped process gets before it is killed.
    #[serde(default = "default_stop_grace")]
    pub stop_grace: String,
}

fn default_status_env() -> String {
    DEFAULT_STATUS_ENV.to_string()
}

fn default_status_fd() -> RawFd {
    DEFAULT_STATUS_FD
}

fn default_inherit_env() -> bool {
    true
}

fn default_stop_grace() -> String {
    "5s".to_string()
}

impl Default for LauncherSection {
    fn default() -> Self {
        Self {
            build_dir: None,
            status_env: default_status_env(),
            status_fd: default_status_fd(),
            inherit_env: default_inherit_env(),
            ready_timeout: None,
            stop_signal: StopSignal::default(),
            stop_grace: default_stop_grace(),
        }
    }
}

/// Validated launcher settings.
///
/// Build one from a file with [`crate::config::load_and_validate`], or start
/// from `LauncherConfig::default()` and adjust fields directly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LauncherConfig {
    pub build_dir: Option<PathBuf>,
    pub status_env: String,
    pub status_fd: RawFd,
    pub inherit_env: bool,
    pub ready_timeout: Option<Duration>,
    pub stop_signal: StopSignal,
    pub stop_grace: Duration,
    pub env: BTreeMap<String, String>,
}

impl Default for LauncherConfig {
    fn default() -> Self {
        Self {
            build_dir: None,
            status_env: default_status_env(),
            status_fd: default_status_fd(),
            inherit_env: default_inherit_env(),
            ready_timeout: None,
            stop_signal: StopSignal::default(),
            stop_grace: Duration::from_secs(5),
            env: BTreeMap::new(),
        }
    }
}

impl LauncherConfig {
    /// Resolve the program path of a launch request.
    ///
    /// Relative paths are joined onto `build_dir` when one is configured;
    /// everything else is passed through untouched (bare names are then
    /// looked up on `PATH` at spawn time).
    pub fn resolve_program(&self, program: &Path) -> PathBuf {
        match &self.build_dir {
            Some(dir) if program.is_relative() => dir.join(program),
            _ => program.to_path_buf(),
        }
    }
}

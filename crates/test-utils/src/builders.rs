#![allow(dead_code)]

use std::time::Duration;

use mountready::config::LauncherConfig;
use mountready::launch::{LaunchRequest, Launcher};
use mountready::types::StopSignal;

/// Path of the POSIX shell used for scripted helpers.
pub const SHELL: &str = "/bin/sh";

/// A request that runs `script` under `/bin/sh -c`.
///
/// Inside the script the status descriptor is `$STATUS_PIPE`, e.g.
/// `printf x >&3`.
pub fn shell_request(script: &str) -> LaunchRequest {
    LaunchRequest::new(SHELL).args(["-c", script])
}

/// Builder for `LauncherConfig` to simplify test setup.
pub struct LauncherConfigBuilder {
    config: LauncherConfig,
}

impl LauncherConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: LauncherConfig {
                // Keep teardown in tests short.
                stop_grace: Duration::from_secs(2),
                ..LauncherConfig::default()
            },
        }
    }

    pub fn ready_timeout(mut self, timeout: Duration) -> Self {
        self.config.ready_timeout = Some(timeout);
        self
    }

    pub fn status_fd(mut self, fd: i32) -> Self {
        self.config.status_fd = fd;
        self
    }

    pub fn status_env(mut self, name: &str) -> Self {
        self.config.status_env = name.to_string();
        self
    }

    pub fn env(mut self, key: &str, value: &str) -> Self {
        self.config.env.insert(key.to_string(), value.to_string());
        self
    }

    pub fn inherit_env(mut self, val: bool) -> Self {
        self.config.inherit_env = val;
        self
    }

    pub fn build_dir(mut self, dir: impl Into<std::path::PathBuf>) -> Self {
        self.config.build_dir = Some(dir.into());
        self
    }

    pub fn stop(mut self, signal: StopSignal, grace: Duration) -> Self {
        self.config.stop_signal = signal;
        self.config.stop_grace = grace;
        self
    }

    pub fn build(self) -> LauncherConfig {
        self.config
    }

    pub fn launcher(self) -> Launcher {
        Launcher::new(self.config)
    }
}

impl Default for LauncherConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// src/launch/mod.rs

//! Launch-and-wait-for-mount layer.
//!
//! A mount helper is started with an extra inherited descriptor (the status
//! pipe) and an environment variable naming it. It writes one byte there once
//! the filesystem is up. The launch resolves as soon as either that byte
//! arrives or the process exits.
//!
//! - [`request`] describes what to launch.
//! - [`signal`] owns the per-launch status pipe.
//! - [`process`] spawns the program and supervises it until exit, capturing
//!   combined output.
//! - [`race`] turns "byte vs. exit" into a single [`LaunchOutcome`].
//! - [`outcome`] holds the result types.
//! - [`session`] is the handle returned for a process that came up.

pub mod outcome;
pub mod process;
pub mod race;
pub mod request;
pub mod session;
pub mod signal;

pub use outcome::{ExitCause, LaunchOutcome, ProcessExit};
pub use process::{ExitError, ProcessReport, RunningProcess, spawn_process};
pub use race::await_readiness;
pub use request::LaunchRequest;
pub use session::MountedProcess;
pub use signal::{SignalChannel, SignalReadError, SignalReader, SignalWriter};

use tracing::debug;

use crate::config::LauncherConfig;
use crate::errors::{MountReadyError, Result};

/// Launches mount helpers according to a [`LauncherConfig`].
#[derive(Debug, Clone, Default)]
pub struct Launcher {
    config: LauncherConfig,
}

impl Launcher {
    pub fn new(config: LauncherConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LauncherConfig {
        &self.config
    }

    /// Launch `request` and wait until it is either mounted or gone.
    ///
    /// `Err` means nothing was raced: the status pipe could not be created or
    /// the program could not be spawned. Every other failure is a
    /// [`LaunchOutcome::ProcessExited`]. No retries happen here; a new
    /// attempt needs a new call.
    pub async fn attempt_launch(&self, request: LaunchRequest) -> Result<LaunchOutcome> {
        let channel = SignalChannel::new().map_err(MountReadyError::SignalChannel)?;
        let (reader, writer) = channel.split();

        let process = spawn_process(&self.config, &request, writer)?;
        let outcome = await_readiness(process, reader, &self.config).await;

        debug!(
            program = %request.program.display(),
            ready = outcome.is_ready(),
            "launch resolved"
        );
        Ok(outcome)
    }
}

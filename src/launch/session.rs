// src/launch/session.rs

//! Handle to a process that signalled readiness.

use std::future::Future;
use std::path::Path;
use std::time::Duration;

use tracing::{info, warn};

use crate::launch::process::{ProcessReport, RunningProcess, join_report};
use crate::types::StopSignal;

/// A mounted (ready) process, owned by the caller.
///
/// The process keeps running until one of the teardown methods is called.
/// Dropping the handle kills it.
#[derive(Debug)]
pub struct MountedProcess {
    process: RunningProcess,
    stop_signal: StopSignal,
    stop_grace: Duration,
}

impl MountedProcess {
    pub(crate) fn new(process: RunningProcess, stop_signal: StopSignal, stop_grace: Duration) -> Self {
        Self {
            process,
            stop_signal,
            stop_grace,
        }
    }

    pub fn pid(&self) -> Option<u32> {
        self.process.pid()
    }

    pub fn program(&self) -> &Path {
        self.process.program()
    }

    /// Whether the process has already exited on its own.
    pub fn is_finished(&self) -> bool {
        self.process.exit.is_finished()
    }

    /// Ask the process to stop, escalating to `SIGKILL` after the grace period.
    pub async fn terminate(mut self) -> ProcessReport {
        info!(
            program = %self.program().display(),
            pid = self.pid(),
            signal = ?self.stop_signal,
            "stopping mounted process"
        );
        self.process.signal(self.stop_signal.as_signal()).await;

        let waited = tokio::time::timeout(self.stop_grace, &mut self.process.exit).await;
        match waited {
            Ok(res) => join_report(res),
            Err(_) => {
                warn!(
                    program = %self.program().display(),
                    pid = self.pid(),
                    grace = ?self.stop_grace,
                    "process ignored stop signal; killing"
                );
                self.kill().await
            }
        }
    }

    pub async fn kill(self) -> ProcessReport {
        self.process.kill().await;
        self.process.wait().await
    }

    /// Wait for the process to exit on its own.
    pub async fn wait(self) -> ProcessReport {
        self.process.wait().await
    }

    /// Wait for the process to exit, or terminate it once `shutdown`
    /// resolves, whichever comes first.
    pub async fn run_until<F>(mut self, shutdown: F) -> ProcessReport
    where
        F: Future<Output = ()>,
    {
        tokio::select! {
            res = &mut self.process.exit => join_report(res),
            () = shutdown => self.terminate().await,
        }
    }
}

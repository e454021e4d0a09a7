// src/launch/race.rs

//! Readiness race: status byte versus process exit.

use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::config::LauncherConfig;
use crate::launch::outcome::{ExitCause, LaunchOutcome, ProcessExit};
use crate::launch::process::{RunningProcess, join_report};
use crate::launch::session::MountedProcess;
use crate::launch::signal::SignalReader;

/// Resolve one launch into exactly one [`LaunchOutcome`].
///
/// - Readiness byte first: `Ready`, without waiting for the process.
/// - Process exit first: `ProcessExited`, whatever the pipe says later.
/// - Pipe failure first: the process result is awaited and reported as
///   `ProcessExited` with the pipe error as its cause.
/// - `ready_timeout` elapsed first: the process is killed and reported as
///   `ProcessExited`.
///
/// The read end of the status pipe is closed before this returns.
pub async fn await_readiness(
    mut process: RunningProcess,
    signal: SignalReader,
    config: &LauncherConfig,
) -> LaunchOutcome {
    let deadline = config.ready_timeout;

    let ready = signal.wait_ready();
    tokio::pin!(ready);

    let expired = deadline_elapsed(deadline);
    tokio::pin!(expired);

    tokio::select! {
        res = &mut process.exit => {
            let report = join_report(res);
            debug!(program = %process.program.display(), "process exited before readiness");
            LaunchOutcome::ProcessExited(ProcessExit::new(
                process.program,
                report,
                ExitCause::ExitedFirst,
            ))
        }

        res = &mut ready => match res {
            Ok(()) => {
                info!(
                    program = %process.program.display(),
                    pid = process.pid,
                    "process signalled readiness"
                );
                LaunchOutcome::Ready(MountedProcess::new(
                    process,
                    config.stop_signal,
                    config.stop_grace,
                ))
            }
            Err(err) => {
                debug!(
                    program = %process.program.display(),
                    error = %err,
                    "status pipe failed; waiting for process result"
                );
                let program = process.program.clone();
                let report = process.wait().await;
                LaunchOutcome::ProcessExited(ProcessExit::new(
                    program,
                    report,
                    ExitCause::SignalFailed(err),
                ))
            }
        },

        after = &mut expired => {
            warn!(
                program = %process.program.display(),
                pid = process.pid,
                timeout = ?after,
                "process not ready in time; killing"
            );
            process.kill().await;
            let program = process.program.clone();
            let report = process.wait().await;
            LaunchOutcome::ProcessExited(ProcessExit::new(
                program,
                report,
                ExitCause::DeadlineExceeded(after),
            ))
        }
    }
}

async fn deadline_elapsed(deadline: Option<Duration>) -> Duration {
    match deadline {
        Some(after) => {
            sleep(after).await;
            after
        }
        None => std::future::pending().await,
    }
}

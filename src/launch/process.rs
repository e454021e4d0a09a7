// src/launch/process.rs

//! Process launcher: spawns the program with the status pipe installed and
//! supervises it until it exits.

use std::io;
use std::os::fd::{AsRawFd, FromRawFd, OwnedFd, RawFd};
use std::os::unix::process::ExitStatusExt;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::sync::Mutex;
use std::time::Duration;

use nix::fcntl::OFlag;
use nix::libc;
use nix::sys::signal::{Signal, killpg};
use nix::unistd::{Pid, pipe2};
use thiserror::Error;
use tokio::io::AsyncReadExt;
use tokio::net::unix::pipe;
use tokio::process::{Child, Command};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::LauncherConfig;
use crate::errors::{MountReadyError, Result};
use crate::launch::request::LaunchRequest;
use crate::launch::signal::SignalWriter;

/// How long output is still drained after the process itself has exited.
///
/// Descendants that inherited stdout can keep the pipe open indefinitely;
/// whatever they have written by then is kept, the rest is dropped.
const OUTPUT_DRAIN_GRACE: Duration = Duration::from_millis(500);

/// Most combined output kept per process. Older bytes are dropped first, so
/// a long-lived chatty helper keeps only its most recent output.
pub const OUTPUT_LIMIT: usize = 1 << 20;

/// Serialises spawns that install a status descriptor.
///
/// std reports exec failures over a close-on-exec pipe created just before
/// `fork`. If that pipe landed on the status descriptor number, our `dup2`
/// in the child would overwrite it and a failed exec would look like a
/// readiness byte. Holding the target number open in the parent for the
/// duration of the spawn keeps the error pipe off it.
static SPAWN_LOCK: Mutex<()> = Mutex::new(());

/// Why a process counts as having failed.
#[derive(Debug, Error)]
pub enum ExitError {
    #[error("exit status {0}")]
    Status(i32),

    #[error("signal: {}", signal_name(.0))]
    Signaled(i32),

    #[error("waiting for process: {0}")]
    Wait(#[source] io::Error),

    /// The supervising task went away without reporting (runtime shutdown or
    /// panic).
    #[error("process supervisor stopped: {0}")]
    Aborted(String),
}

fn signal_name(signo: &i32) -> String {
    match Signal::try_from(*signo) {
        Ok(sig) => sig.as_str().to_string(),
        Err(_) => signo.to_string(),
    }
}

/// Final result of a launched process: exit status plus combined output.
#[derive(Debug)]
pub struct ProcessReport {
    /// `None` when the status could not be collected.
    pub status: Option<ExitStatus>,
    /// `None` for a clean (status 0) exit.
    pub error: Option<ExitError>,
    /// Stdout and stderr interleaved in the order the process wrote them,
    /// capped to the last [`OUTPUT_LIMIT`] bytes.
    pub output: Vec<u8>,
}

impl ProcessReport {
    fn from_wait(status: io::Result<ExitStatus>, output: Vec<u8>) -> Self {
        match status {
            Ok(status) => Self {
                status: Some(status),
                error: exit_error(status),
                output,
            },
            Err(e) => Self {
                status: None,
                error: Some(ExitError::Wait(e)),
                output,
            },
        }
    }

    pub(crate) fn aborted(reason: impl Into<String>) -> Self {
        Self {
            status: None,
            error: Some(ExitError::Aborted(reason.into())),
            output: Vec::new(),
        }
    }

    pub fn success(&self) -> bool {
        self.error.is_none()
    }
}

fn exit_error(status: ExitStatus) -> Option<ExitError> {
    if status.success() {
        return None;
    }
    match status.code() {
        Some(code) => Some(ExitError::Status(code)),
        None => Some(ExitError::Signaled(status.signal().unwrap_or_default())),
    }
}

/// Requests the handle owner can send to the supervising task.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Control {
    Signal(Signal),
    Kill,
}

/// A spawned process that has not been resolved yet.
///
/// The child itself lives in a supervising Tokio task; this handle talks to
/// it over a control channel and receives the [`ProcessReport`] through
/// `exit`. Dropping the handle kills the process.
#[derive(Debug)]
pub struct RunningProcess {
    pub(crate) program: PathBuf,
    pub(crate) pid: Option<u32>,
    pub(crate) control: mpsc::Sender<Control>,
    pub(crate) exit: JoinHandle<ProcessReport>,
}

impl RunningProcess {
    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Send `signal` to the process group. No-op once the process is gone.
    pub async fn signal(&self, signal: Signal) {
        let _ = self.control.send(Control::Signal(signal)).await;
    }

    pub async fn kill(&self) {
        let _ = self.control.send(Control::Kill).await;
    }

    /// Wait for the process to exit and return its report.
    pub async fn wait(self) -> ProcessReport {
        join_report(self.exit.await)
    }
}

pub(crate) fn join_report(
    res: std::result::Result<ProcessReport, tokio::task::JoinError>,
) -> ProcessReport {
    res.unwrap_or_else(|e| ProcessReport::aborted(e.to_string()))
}

/// Spawn `request` with `status` installed as `config.status_fd`.
///
/// Spawn failures (missing binary, permission denied) are returned
/// immediately. On success the local copy of `status` has been closed and the
/// child is supervised in the background.
///
/// Must be called from within a Tokio runtime.
pub fn spawn_process(
    config: &LauncherConfig,
    request: &LaunchRequest,
    status: SignalWriter,
) -> Result<RunningProcess> {
    let target_fd = config.status_fd;
    if target_fd <= libc::STDERR_FILENO {
        return Err(MountReadyError::ConfigError(format!(
            "status_fd must be >= 3 (got {target_fd})"
        )));
    }
    let program = config.resolve_program(&request.program);

    // stdout and stderr share one pipe so their bytes interleave.
    let (output_reader, output_writer) = pipe2(OFlag::O_CLOEXEC).map_err(io::Error::from)?;
    let stderr_writer = output_writer.try_clone()?;

    let mut cmd = Command::new(&program);
    cmd.args(&request.args);
    if !config.inherit_env {
        cmd.env_clear();
    }
    cmd.envs(&config.env)
        .envs(&request.env)
        .env(&config.status_env, config.status_fd.to_string());

    cmd.stdin(Stdio::null())
        .stdout(Stdio::from(output_writer))
        .stderr(Stdio::from(stderr_writer))
        .process_group(0)
        .kill_on_drop(true);

    let spawned = {
        let _guard = SPAWN_LOCK.lock().unwrap_or_else(|e| e.into_inner());

        // Park the status pipe on the target number when it is free; when
        // something else already holds that number the error pipe cannot
        // land there either.
        let reserved = reserve_fd(&status, target_fd)?;
        let status_fd = match &reserved {
            Some(fd) => fd.as_raw_fd(),
            None => status.as_raw_fd(),
        };

        // SAFETY: the closure only calls async-signal-safe libc functions.
        unsafe {
            cmd.pre_exec(move || install_status_fd(status_fd, target_fd));
        }
        let spawned = cmd.spawn();
        drop(reserved);
        spawned
    };

    // The command still owns our copies of the output write ends, and
    // `status` is the only parent-side write end of the status pipe. Both
    // must be closed before anyone waits for end-of-input.
    drop(cmd);
    drop(status);

    let child = spawned.map_err(|source| MountReadyError::Spawn {
        program: program.clone(),
        source,
    })?;
    let pid = child.id();

    info!(
        program = %program.display(),
        pid,
        status_fd = target_fd,
        args = ?request.args,
        "launched process"
    );

    let (control_tx, control_rx) = mpsc::channel(4);
    let exit = tokio::spawn(supervise(child, output_reader, control_rx, program.clone()));

    Ok(RunningProcess {
        program,
        pid,
        control: control_tx,
        exit,
    })
}

/// Duplicate `status` onto `target` (close-on-exec) if `target` is not open
/// in this process. Returns `None` when the number is already taken.
fn reserve_fd(status: &SignalWriter, target: RawFd) -> io::Result<Option<OwnedFd>> {
    // SAFETY: plain descriptor queries and duplication; ownership of the new
    // descriptor is taken immediately.
    unsafe {
        if libc::fcntl(target, libc::F_GETFD) >= 0 {
            return Ok(None);
        }
        let err = io::Error::last_os_error();
        if err.raw_os_error() != Some(libc::EBADF) {
            return Err(err);
        }
        if libc::dup3(status.as_raw_fd(), target, libc::O_CLOEXEC) < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(Some(OwnedFd::from_raw_fd(target)))
    }
}

/// Runs in the forked child between `fork` and `exec`.
fn install_status_fd(fd: RawFd, target: RawFd) -> io::Result<()> {
    unsafe {
        if fd == target {
            // Already in place; only the close-on-exec flag has to go.
            let flags = libc::fcntl(fd, libc::F_GETFD);
            if flags < 0 || libc::fcntl(fd, libc::F_SETFD, flags & !libc::FD_CLOEXEC) < 0 {
                return Err(io::Error::last_os_error());
            }
        } else if libc::dup2(fd, target) < 0 {
            return Err(io::Error::last_os_error());
        }
    }
    Ok(())
}

async fn supervise(
    mut child: Child,
    output: OwnedFd,
    mut control_rx: mpsc::Receiver<Control>,
    program: PathBuf,
) -> ProcessReport {
    let pid = child.id();
    let mut buf = Vec::new();

    let status = {
        let collect = collect_output(output, &mut buf);
        tokio::pin!(collect);

        let wait = wait_with_control(&mut child, pid, &mut control_rx, &program);
        tokio::pin!(wait);

        // Keep draining while the process runs so it never blocks on a full
        // pipe; once it has exited give the drain a bounded window.
        let mut drained = false;
        let status = tokio::select! {
            status = &mut wait => status,
            () = &mut collect => {
                drained = true;
                wait.await
            }
        };

        if !drained && tokio::time::timeout(OUTPUT_DRAIN_GRACE, &mut collect).await.is_err() {
            debug!(
                program = %program.display(),
                "output pipe still held open after exit; keeping what was read"
            );
        }

        status
    };

    trim_to_limit(&mut buf);
    let report = ProcessReport::from_wait(status, buf);
    match &report.error {
        None => info!(program = %program.display(), pid, "process exited cleanly"),
        Some(err) => info!(
            program = %program.display(),
            pid,
            exit_code = report.status.and_then(|s| s.code()),
            error = %err,
            "process exited"
        ),
    }
    report
}

async fn wait_with_control(
    child: &mut Child,
    pid: Option<u32>,
    control_rx: &mut mpsc::Receiver<Control>,
    program: &Path,
) -> io::Result<ExitStatus> {
    let mut owner_gone = false;

    loop {
        tokio::select! {
            status = child.wait() => return status,

            msg = control_rx.recv(), if !owner_gone => {
                let request = match msg {
                    Some(request) => request,
                    None => {
                        debug!(
                            program = %program.display(),
                            pid,
                            "process handle dropped; killing process"
                        );
                        owner_gone = true;
                        Control::Kill
                    }
                };
                deliver(child, pid, request, program);
            }
        }
    }
}

fn deliver(child: &mut Child, pid: Option<u32>, request: Control, program: &Path) {
    let Some(pid) = pid else {
        return;
    };
    // The child leads its own process group; signal the whole group so
    // helpers it forked go down with it.
    let group = Pid::from_raw(pid as i32);
    let signal = match request {
        Control::Signal(signal) => signal,
        Control::Kill => Signal::SIGKILL,
    };

    debug!(program = %program.display(), pid, signal = ?signal, "signalling process group");
    if let Err(e) = killpg(group, signal) {
        warn!(
            program = %program.display(),
            pid,
            error = %e,
            "failed to signal process group"
        );
        if matches!(request, Control::Kill) {
            let _ = child.start_kill();
        }
    }
}

/// Read the combined output pipe until end-of-input.
///
/// Appends chunk by chunk so that whatever was read survives if the future
/// is dropped part-way.
async fn collect_output(fd: OwnedFd, buf: &mut Vec<u8>) {
    let mut receiver = match pipe::Receiver::from_owned_fd(fd) {
        Ok(r) => r,
        Err(e) => {
            warn!(error = %e, "cannot read process output");
            return;
        }
    };

    let mut chunk = [0u8; 4096];
    loop {
        match receiver.read(&mut chunk).await {
            Ok(0) => return,
            Ok(n) => {
                buf.extend_from_slice(&chunk[..n]);
                if buf.len() > 2 * OUTPUT_LIMIT {
                    trim_to_limit(buf);
                }
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => {
                warn!(error = %e, "error reading process output");
                return;
            }
        }
    }
}

/// Drop the oldest bytes so at most [`OUTPUT_LIMIT`] remain.
fn trim_to_limit(buf: &mut Vec<u8>) {
    if buf.len() > OUTPUT_LIMIT {
        let excess = buf.len() - OUTPUT_LIMIT;
        buf.drain(..excess);
    }
}

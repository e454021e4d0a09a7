// src/launch/outcome.rs

use std::borrow::Cow;
use std::fmt;
use std::path::PathBuf;
use std::process::ExitStatus;
use std::time::Duration;

use regex::Regex;

use crate::launch::process::{ExitError, ProcessReport};
use crate::launch::session::MountedProcess;
use crate::launch::signal::SignalReadError;

/// The single result of one launch attempt.
#[derive(Debug)]
pub enum LaunchOutcome {
    /// The readiness byte arrived first; the process is still running.
    Ready(MountedProcess),
    /// The process ended without confirming readiness.
    ProcessExited(ProcessExit),
}

impl LaunchOutcome {
    pub fn is_ready(&self) -> bool {
        matches!(self, LaunchOutcome::Ready(_))
    }

    pub fn exit(&self) -> Option<&ProcessExit> {
        match self {
            LaunchOutcome::Ready(_) => None,
            LaunchOutcome::ProcessExited(exit) => Some(exit),
        }
    }

    /// Treat anything but `Ready` as an error.
    pub fn into_result(self) -> Result<MountedProcess, ProcessExit> {
        match self {
            LaunchOutcome::Ready(mounted) => Ok(mounted),
            LaunchOutcome::ProcessExited(exit) => Err(exit),
        }
    }
}

/// What preceded the process result.
#[derive(Debug)]
pub enum ExitCause {
    /// The process ended before the status pipe said anything.
    ExitedFirst,
    /// Reading the status pipe failed first; the process result was awaited
    /// afterwards.
    SignalFailed(SignalReadError),
    /// The readiness deadline elapsed and the process was killed.
    DeadlineExceeded(Duration),
}

/// A process that exited without signalling readiness.
///
/// A clean exit (`error == None`) is still a failure to mount.
#[derive(Debug)]
pub struct ProcessExit {
    pub program: PathBuf,
    pub status: Option<ExitStatus>,
    pub error: Option<ExitError>,
    /// Combined stdout + stderr.
    pub output: Vec<u8>,
    pub cause: ExitCause,
}

impl ProcessExit {
    pub(crate) fn new(program: PathBuf, report: ProcessReport, cause: ExitCause) -> Self {
        Self {
            program,
            status: report.status,
            error: report.error,
            output: report.output,
            cause,
        }
    }

    pub fn exit_code(&self) -> Option<i32> {
        self.status.and_then(|s| s.code())
    }

    pub fn output_str(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.output)
    }

    /// Whether the combined output matches `pattern` anywhere.
    pub fn output_matches(&self, pattern: &str) -> Result<bool, regex::Error> {
        let re = Regex::new(pattern)?;
        Ok(re.is_match(&self.output_str()))
    }

    fn program_name(&self) -> Cow<'_, str> {
        match self.program.file_name() {
            Some(name) => name.to_string_lossy(),
            None => self.program.to_string_lossy(),
        }
    }
}

impl fmt::Display for ProcessExit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let program = self.program_name();
        match &self.cause {
            ExitCause::ExitedFirst => write!(f, "{program}: ")?,
            ExitCause::SignalFailed(err) => write!(f, "{program} after pipe error ({err}): ")?,
            ExitCause::DeadlineExceeded(after) => {
                write!(f, "{program} not ready after {after:?}, killed: ")?
            }
        }
        match &self.error {
            Some(err) => write!(f, "{err}")?,
            None => write!(f, "exited before signalling readiness")?,
        }
        write!(f, "\nOutput:\n{}", self.output_str())
    }
}

impl std::error::Error for ProcessExit {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match &self.cause {
            ExitCause::SignalFailed(err) => Some(err),
            _ => self.error.as_ref().map(|e| e as _),
        }
    }
}

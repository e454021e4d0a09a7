// src/launch/signal.rs

//! The one-shot status pipe a launched process uses to announce readiness.
//!
//! Both ends are created close-on-exec. The launcher installs the write end
//! into the child at a fixed descriptor number (which clears the flag for
//! that copy only) and then drops its own copy, so once the child is gone the
//! read end observes end-of-input instead of blocking forever.

use std::io::{self, Write};
use std::os::fd::{AsRawFd, OwnedFd, RawFd};

use nix::fcntl::OFlag;
use nix::unistd::pipe2;
use thiserror::Error;
use tokio::io::AsyncReadExt;
use tokio::net::unix::pipe;

/// Why no readiness byte could be read.
#[derive(Debug, Error)]
pub enum SignalReadError {
    /// Every write end was closed before a byte arrived.
    #[error("status pipe closed before a readiness byte arrived")]
    Closed,

    #[error("reading status pipe: {0}")]
    Io(#[from] io::Error),
}

/// A freshly created status pipe. Never reused across launches.
#[derive(Debug)]
pub struct SignalChannel {
    reader: SignalReader,
    writer: SignalWriter,
}

impl SignalChannel {
    pub fn new() -> io::Result<Self> {
        let (read_fd, write_fd) = pipe2(OFlag::O_CLOEXEC)?;
        Ok(Self {
            reader: SignalReader { fd: read_fd },
            writer: SignalWriter { fd: write_fd },
        })
    }

    pub fn split(self) -> (SignalReader, SignalWriter) {
        (self.reader, self.writer)
    }
}

/// Write end of the status pipe, destined for the child.
#[derive(Debug)]
pub struct SignalWriter {
    fd: OwnedFd,
}

impl SignalWriter {
    /// Write the readiness byte and close this end.
    ///
    /// This is what a launched program does from its side; the coordinator
    /// itself never writes.
    pub fn notify(self) -> io::Result<()> {
        let mut file = std::fs::File::from(self.fd);
        file.write_all(&[0])
    }
}

impl AsRawFd for SignalWriter {
    fn as_raw_fd(&self) -> RawFd {
        self.fd.as_raw_fd()
    }
}

/// Read end of the status pipe, kept by the coordinator.
#[derive(Debug)]
pub struct SignalReader {
    fd: OwnedFd,
}

impl SignalReader {
    /// Wait for exactly one byte.
    ///
    /// Dropping the returned future closes the read end.
    pub async fn wait_ready(self) -> Result<(), SignalReadError> {
        let mut receiver = pipe::Receiver::from_owned_fd(self.fd)?;
        let mut buf = [0u8; 1];
        match receiver.read(&mut buf).await? {
            0 => Err(SignalReadError::Closed),
            _ => Ok(()),
        }
    }
}

// src/bin/fake-mount.rs

//! Stand-in mount helper that speaks the status-pipe protocol.
//!
//! `fake-mount [-o OPTIONS] [--mount-delay DURATION] <bucket> <mountpoint>`
//!
//! Mounts nothing. Once the arguments check out it writes one byte to the
//! descriptor named by `STATUS_PIPE`, closes it, and stays up until it gets
//! `SIGTERM`/`SIGINT`, then exits 0.

use std::fs::File;
use std::io::Write;
use std::os::fd::{FromRawFd, RawFd};
use std::path::Path;
use std::process::exit;

use clap::Parser;
use clap::error::{ContextKind, ErrorKind};
use nix::sys::signal::{SigSet, Signal};

use mountready::config::model::DEFAULT_STATUS_ENV;
use mountready::types::parse_duration;

#[derive(Debug, Parser)]
#[command(name = "fake-mount", about = "Pretend to mount a bucket.")]
struct Args {
    /// Mount options, e.g. `ro`.
    #[arg(short = 'o', value_name = "OPTIONS")]
    options: Vec<String>,

    /// Wait this long before reporting readiness, e.g. `200ms`.
    #[arg(long, value_name = "DURATION")]
    mount_delay: Option<String>,

    #[arg(value_name = "ARG")]
    positional: Vec<String>,
}

fn main() {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) if e.kind() == ErrorKind::UnknownArgument => {
            let flag = e
                .get(ContextKind::InvalidArg)
                .map(|v| v.to_string())
                .unwrap_or_default();
            fail(&format!("flag provided but not defined: {flag}"));
        }
        Err(e) => e.exit(),
    };

    if args.positional.len() != 2 {
        fail(&format!(
            "Error: fake-mount takes exactly two arguments (bucket and mountpoint); got {}",
            args.positional.len()
        ));
    }

    let bucket = &args.positional[0];
    let mountpoint = Path::new(&args.positional[1]);
    if !mountpoint.is_dir() {
        fail(&format!("mountpoint {}: not a directory", mountpoint.display()));
    }

    if let Some(ref s) = args.mount_delay {
        match parse_duration(s) {
            Ok(delay) => std::thread::sleep(delay),
            Err(e) => fail(&format!("--mount-delay: {e}")),
        }
    }

    // Block the stop signals before announcing readiness so none is lost.
    let mut stop = SigSet::empty();
    stop.add(Signal::SIGTERM);
    stop.add(Signal::SIGINT);
    if let Err(e) = stop.thread_block() {
        fail(&format!("blocking signals: {e}"));
    }

    println!(
        "Mounted {bucket} at {} (options: {:?})",
        mountpoint.display(),
        args.options
    );
    if let Err(e) = report_ready() {
        fail(&format!("writing status: {e}"));
    }
    println!("File system has been successfully mounted.");

    match stop.wait() {
        Ok(sig) => {
            println!("Received {}; unmounting.", sig.as_str());
            exit(0);
        }
        Err(e) => fail(&format!("waiting for signal: {e}")),
    }
}

/// Write the readiness byte to the inherited status descriptor, if any.
fn report_ready() -> std::io::Result<()> {
    let Ok(value) = std::env::var(DEFAULT_STATUS_ENV) else {
        return Ok(());
    };
    let fd: RawFd = value.trim().parse().map_err(|e| {
        std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("{DEFAULT_STATUS_ENV}={value}: {e}"),
        )
    })?;
    if fd < 3 {
        return Err(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("{DEFAULT_STATUS_ENV}={fd}: refusing to use a standard stream"),
        ));
    }

    // SAFETY: the launcher hands this descriptor to us; nothing else in this
    // process uses it.
    let mut file = unsafe { File::from_raw_fd(fd) };
    file.write_all(&[1])?;
    // Dropping `file` closes the descriptor.
    Ok(())
}

fn fail(msg: &str) -> ! {
    eprintln!("{msg}");
    exit(1);
}

// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Command-line arguments for `mountready`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "mountready",
    version,
    about = "Launch a mount helper and wait until it reports the filesystem is mounted.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// Default: `Mountready.toml` in the current working directory, if it
    /// exists; otherwise built-in defaults.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Give up (and kill the helper) if it is not ready after this long,
    /// e.g. `30s`.
    #[arg(long, value_name = "DURATION")]
    pub ready_timeout: Option<String>,

    /// Environment variable carrying the status descriptor number.
    #[arg(long, value_name = "NAME")]
    pub status_env: Option<String>,

    /// Descriptor number the status pipe is installed at in the helper.
    #[arg(long, value_name = "FD")]
    pub status_fd: Option<i32>,

    /// Directory relative program paths are resolved against.
    #[arg(long, value_name = "DIR")]
    pub build_dir: Option<PathBuf>,

    /// Extra environment for the helper; may be repeated.
    #[arg(long = "env", value_name = "KEY=VALUE", value_parser = parse_key_val)]
    pub env: Vec<(String, String)>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `MOUNTREADY_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Resolve and print the launch, but don't start anything.
    #[arg(long)]
    pub dry_run: bool,

    /// Mount helper to launch.
    #[arg(value_name = "PROGRAM")]
    pub program: PathBuf,

    /// Arguments passed to the helper verbatim.
    #[arg(
        value_name = "ARGS",
        trailing_var_arg = true,
        allow_hyphen_values = true
    )]
    pub args: Vec<String>,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

fn parse_key_val(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected KEY=VALUE, got '{s}'")),
    }
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}

// src/lib.rs

pub mod cli;
pub mod config;
pub mod errors;
pub mod launch;
pub mod logging;
pub mod types;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::cli::CliArgs;
use crate::config::{LauncherConfig, default_config_path, load_and_validate, validate_launcher_config};
use crate::launch::{LaunchOutcome, LaunchRequest, Launcher};
use crate::types::parse_duration;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading (+ CLI overrides)
/// - one launch attempt
/// - Ctrl-C driven teardown of a mounted helper
pub async fn run(args: CliArgs) -> Result<()> {
    let config = resolve_config(&args)?;
    let request = LaunchRequest::new(&args.program).args(args.args.iter().cloned());

    if args.dry_run {
        print_dry_run(&config, &request);
        return Ok(());
    }

    let launcher = Launcher::new(config);
    let outcome = launcher.attempt_launch(request).await?;

    let mounted = match outcome {
        LaunchOutcome::Ready(mounted) => mounted,
        LaunchOutcome::ProcessExited(exit) => return Err(exit.into()),
    };

    println!(
        "mounted: {} (pid {})",
        mounted.program().display(),
        mounted
            .pid()
            .map(|p| p.to_string())
            .unwrap_or_else(|| "?".to_string())
    );

    let report = mounted.run_until(shutdown_requested()).await;
    match &report.error {
        None => info!("mount helper exited cleanly"),
        Some(err) => warn!(error = %err, "mount helper exited with error"),
    }
    if !report.output.is_empty() {
        eprint!("{}", String::from_utf8_lossy(&report.output));
    }

    Ok(())
}

/// Load the config file (explicit or default) and apply CLI overrides.
fn resolve_config(args: &CliArgs) -> Result<LauncherConfig> {
    let mut config = match &args.config {
        Some(path) => load_and_validate(path)
            .with_context(|| format!("loading config from {:?}", path))?,
        None => {
            let path = default_config_path();
            if path.is_file() {
                load_and_validate(&path)
                    .with_context(|| format!("loading config from {:?}", path))?
            } else {
                LauncherConfig::default()
            }
        }
    };

    if let Some(ref s) = args.ready_timeout {
        let timeout = parse_duration(s).map_err(|e| anyhow::anyhow!("--ready-timeout: {e}"))?;
        config.ready_timeout = Some(timeout);
    }
    if let Some(ref name) = args.status_env {
        config.status_env = name.clone();
    }
    if let Some(fd) = args.status_fd {
        config.status_fd = fd;
    }
    if let Some(ref dir) = args.build_dir {
        config.build_dir = Some(dir.clone());
    }
    for (key, value) in &args.env {
        config.env.insert(key.clone(), value.clone());
    }

    validate_launcher_config(&config)?;
    Ok(config)
}

async fn shutdown_requested() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        eprintln!("failed to listen for Ctrl+C: {e}");
        // Without Ctrl-C the helper can only end on its own.
        std::future::pending::<()>().await;
    }
}

/// Simple dry-run output: print what would be launched and how.
fn print_dry_run(config: &LauncherConfig, request: &LaunchRequest) {
    println!("mountready dry-run");
    println!(
        "  program: {}",
        config.resolve_program(&request.program).display()
    );
    println!("  args: {:?}", request.args);
    println!("  status: {}={}", config.status_env, config.status_fd);
    println!("  inherit_env: {}", config.inherit_env);
    match config.ready_timeout {
        Some(t) => println!("  ready_timeout: {t:?}"),
        None => println!("  ready_timeout: none"),
    }
    println!(
        "  stop: {:?} then kill after {:?}",
        config.stop_signal, config.stop_grace
    );
    for (key, value) in &config.env {
        println!("  env: {key}={value}");
    }
}

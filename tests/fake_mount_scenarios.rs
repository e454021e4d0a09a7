// tests/fake_mount_scenarios.rs
mod common;
use crate::common::{fake_mount, init_tracing, with_timeout, LauncherConfigBuilder};

use std::error::Error;

use mountready::launch::{LaunchOutcome, LaunchRequest, ProcessExit};
use tempfile::tempdir;

type TestResult = Result<(), Box<dyn Error>>;

const BUCKET: &str = "fake@bucket";

fn expect_exited(outcome: LaunchOutcome) -> ProcessExit {
    match outcome {
        LaunchOutcome::ProcessExited(exit) => exit,
        LaunchOutcome::Ready(_) => panic!("expected ProcessExited, got Ready"),
    }
}

#[tokio::test]
async fn read_only_mount_becomes_ready() -> TestResult {
    init_tracing();

    let dir = tempdir()?;
    let mountpoint = dir.path().to_string_lossy().to_string();

    let launcher = LauncherConfigBuilder::new().launcher();
    let request = LaunchRequest::new(fake_mount()).args(["-o", "ro", BUCKET, &mountpoint]);
    let outcome = with_timeout(launcher.attempt_launch(request)).await?;

    let mounted = outcome.into_result()?;
    assert!(!mounted.is_finished());

    // fake-mount treats SIGTERM as "unmount" and exits cleanly.
    let report = with_timeout(mounted.terminate()).await;
    assert!(report.success(), "got {:?}", report.error);
    let output = String::from_utf8_lossy(&report.output);
    assert!(output.contains("successfully mounted"), "output: {output}");
    assert!(output.contains("unmounting"), "output: {output}");
    Ok(())
}

#[tokio::test]
async fn delayed_mount_still_becomes_ready() -> TestResult {
    init_tracing();

    let dir = tempdir()?;
    let mountpoint = dir.path().to_string_lossy().to_string();

    let launcher = LauncherConfigBuilder::new().launcher();
    let request = LaunchRequest::new(fake_mount())
        .args(["--mount-delay", "200ms", BUCKET, &mountpoint]);
    let outcome = with_timeout(launcher.attempt_launch(request)).await?;

    assert!(outcome.is_ready(), "got {:?}", outcome.exit());
    Ok(())
}

/// Bad usage: each case exits 1 before signalling, with a recognisable
/// message in the combined output.
#[tokio::test]
async fn bad_usage_is_reported_with_output() -> TestResult {
    init_tracing();

    let dir = tempdir()?;
    let mountpoint = dir.path().to_string_lossy().to_string();

    let cases: Vec<(Vec<&str>, &str)> = vec![
        // Too few args
        (vec![BUCKET], "exactly two arguments"),
        // Too many args
        (vec![BUCKET, "a", "b"], "exactly two arguments"),
        // Unknown flag
        (
            vec!["--tweak_frobnicator", BUCKET, mountpoint.as_str()],
            "not defined.*tweak_frobnicator",
        ),
    ];

    let launcher = LauncherConfigBuilder::new().launcher();
    for (i, (args, expected)) in cases.into_iter().enumerate() {
        let request = LaunchRequest::new(fake_mount()).args(args);
        let outcome = with_timeout(launcher.attempt_launch(request)).await?;

        let exit = expect_exited(outcome);
        assert_eq!(exit.exit_code(), Some(1), "case {i}");
        assert!(exit.to_string().contains("exit status"), "case {i}");
        assert!(
            exit.output_matches(expected)?,
            "case {i}: output {:?} does not match {expected:?}",
            exit.output_str()
        );
    }
    Ok(())
}

#[tokio::test]
async fn missing_mountpoint_fails_to_mount() -> TestResult {
    init_tracing();

    let dir = tempdir()?;
    let missing = dir.path().join("nope").to_string_lossy().to_string();

    let launcher = LauncherConfigBuilder::new().launcher();
    let request = LaunchRequest::new(fake_mount()).args([BUCKET, missing.as_str()]);
    let outcome = with_timeout(launcher.attempt_launch(request)).await?;

    let exit = expect_exited(outcome);
    assert!(exit.output_matches("not a directory")?);
    Ok(())
}

/// The helper refuses to treat a standard stream as its status descriptor.
#[tokio::test]
async fn status_variable_naming_stdout_is_rejected() -> TestResult {
    init_tracing();

    let dir = tempdir()?;
    let mountpoint = dir.path().to_string_lossy().to_string();

    // The launcher announces the real pipe under another name, leaving
    // STATUS_PIPE free to point at stdout.
    let launcher = LauncherConfigBuilder::new()
        .status_env("MOUNT_STATUS_FD")
        .launcher();
    let request = LaunchRequest::new(fake_mount())
        .args([BUCKET, mountpoint.as_str()])
        .env("STATUS_PIPE", "1");
    let outcome = with_timeout(launcher.attempt_launch(request)).await?;

    let exit = expect_exited(outcome);
    assert_eq!(exit.exit_code(), Some(1));
    assert!(
        exit.output_matches("STATUS_PIPE=1: refusing to use a standard stream")?,
        "output: {}",
        exit.output_str()
    );
    Ok(())
}

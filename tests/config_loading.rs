// tests/config_loading.rs

use std::io::Write;
use std::path::Path;
use std::time::Duration;

use tempfile::NamedTempFile;
use mountready::config::{load_and_validate, LauncherConfig};
use mountready::errors::MountReadyError;
use mountready::types::StopSignal;

fn write_config(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{}", contents).unwrap();
    file
}

#[test]
fn empty_file_yields_defaults() {
    let file = write_config("");
    let cfg = load_and_validate(file.path()).unwrap();

    assert_eq!(cfg, LauncherConfig::default());
    assert_eq!(cfg.status_env, "STATUS_PIPE");
    assert_eq!(cfg.status_fd, 3);
    assert!(cfg.inherit_env);
    assert_eq!(cfg.ready_timeout, None);
    assert_eq!(cfg.stop_signal, StopSignal::Term);
    assert_eq!(cfg.stop_grace, Duration::from_secs(5));
}

#[test]
fn full_file_is_parsed() {
    let file = write_config(
        r#"
[launcher]
build_dir = "/opt/build"
status_env = "READY_FD"
status_fd = 5
inherit_env = false
ready_timeout = "30s"
stop_signal = "int"
stop_grace = "250ms"

[env]
GCSFUSE_DEBUG = "1"
"#,
    );
    let cfg = load_and_validate(file.path()).unwrap();

    assert_eq!(cfg.build_dir.as_deref(), Some(Path::new("/opt/build")));
    assert_eq!(cfg.status_env, "READY_FD");
    assert_eq!(cfg.status_fd, 5);
    assert!(!cfg.inherit_env);
    assert_eq!(cfg.ready_timeout, Some(Duration::from_secs(30)));
    assert_eq!(cfg.stop_signal, StopSignal::Int);
    assert_eq!(cfg.stop_grace, Duration::from_millis(250));
    assert_eq!(cfg.env.get("GCSFUSE_DEBUG").map(String::as_str), Some("1"));

    assert_eq!(
        cfg.resolve_program(Path::new("bin/gcsfuse")),
        Path::new("/opt/build/bin/gcsfuse")
    );
    assert_eq!(
        cfg.resolve_program(Path::new("/usr/bin/gcsfuse")),
        Path::new("/usr/bin/gcsfuse")
    );
}

#[test]
fn stdio_status_fd_is_rejected() {
    let file = write_config("[launcher]\nstatus_fd = 1\n");

    match load_and_validate(file.path()) {
        Err(MountReadyError::ConfigError(msg)) => {
            assert!(msg.contains("status_fd must be >= 3"), "msg: {msg}");
        }
        Err(e) => panic!("Expected ConfigError, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn bad_duration_is_rejected() {
    let file = write_config("[launcher]\nready_timeout = \"soon\"\n");

    match load_and_validate(file.path()) {
        Err(MountReadyError::ConfigError(msg)) => {
            assert!(msg.contains("ready_timeout"), "msg: {msg}");
        }
        Err(e) => panic!("Expected ConfigError, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn zero_ready_timeout_is_rejected() {
    let file = write_config("[launcher]\nready_timeout = \"0s\"\n");
    assert!(matches!(
        load_and_validate(file.path()),
        Err(MountReadyError::ConfigError(_))
    ));
}

#[test]
fn invalid_env_name_is_rejected() {
    let file = write_config("[launcher]\nstatus_env = \"A=B\"\n");
    assert!(matches!(
        load_and_validate(file.path()),
        Err(MountReadyError::ConfigError(_))
    ));
}

#[test]
fn unknown_keys_and_bad_signals_are_toml_errors() {
    let file = write_config("[launcher]\nstatus_pipe = 3\n");
    assert!(matches!(
        load_and_validate(file.path()),
        Err(MountReadyError::TomlError(_))
    ));

    let file = write_config("[launcher]\nstop_signal = \"hup\"\n");
    assert!(matches!(
        load_and_validate(file.path()),
        Err(MountReadyError::TomlError(_))
    ));
}

#[test]
fn missing_file_is_io_error() {
    let res = load_and_validate("/nonexistent/Mountready.toml");
    assert!(matches!(res, Err(MountReadyError::IoError(_))));
}

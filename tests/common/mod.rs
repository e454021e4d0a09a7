#![allow(dead_code)]

use std::path::PathBuf;

pub use mountready_test_utils::builders::{shell_request, LauncherConfigBuilder};
pub use mountready_test_utils::{init_tracing, with_timeout};

/// The `fake-mount` helper binary built alongside this crate.
pub fn fake_mount() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_fake-mount"))
}

/// Script tail that reports readiness on fd 3 and then stays up.
pub const READY_THEN_SLEEP: &str = "printf x >&3; exec sleep 30";

// src/launch/request.rs

use std::collections::BTreeMap;
use std::path::PathBuf;

/// What to launch: the program, its arguments, and per-launch environment
/// overrides.
///
/// Arguments are passed as-is (no shell interpretation). Build one with the
/// chained helpers:
///
/// ```
/// use mountready::launch::LaunchRequest;
///
/// let req = LaunchRequest::new("bin/gcsfuse")
///     .args(["-o", "ro", "some-bucket", "/mnt/gcs"])
///     .env("GCSFUSE_DEBUG", "1");
/// assert_eq!(req.args.len(), 4);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchRequest {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub env: BTreeMap<String, String>,
}

impl LaunchRequest {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            env: BTreeMap::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }
}

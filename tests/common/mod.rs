// Shared test helpers for integration tests
#![allow(dead_code)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use sisyphus::core::environment::Environment;
use sisyphus::core::error::Result;
use sisyphus::core::models::StepResult;

/// Writes `content` to `dir/name` and returns the path.
pub fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).expect("Failed to write file");
    path
}

/// Writes a `/bin/sh` script and marks it executable.
pub fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = write_file(dir, name, &format!("#!/bin/sh\n{body}\n"));
    let mut perms = fs::metadata(&path).expect("Failed to stat script").permissions();
    perms.set_mode(0o755);
    fs::set_permissions(&path, perms).expect("Failed to chmod script");
    path
}

/// A step function that fails on its first `failures` calls and succeeds
/// afterwards. `calls` counts every invocation.
pub fn flaky_step(
    calls: Arc<AtomicUsize>,
    failures: usize,
) -> impl Fn(&mut Environment) -> Result<StepResult> + Send + Sync + 'static {
    move |_env| {
        let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
        if n <= failures {
            Ok(StepResult::failure(format!("attempt {n} failed")))
        } else {
            Ok(StepResult::success().with_retcode(0))
        }
    }
}

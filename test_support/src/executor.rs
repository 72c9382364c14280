//! Fake build executors.
//!
//! The fake is a shell script that records its arguments and working
//! directory, prints a marker line on each stream, and exits with a chosen
//! code. Tests point `KUMIKI_BUILD_TOOL` at it.

use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use std::fs;
use tempfile::TempDir;

/// Line the fake executor prints on stdout.
pub const STDOUT_MARKER: &str = "fake executor: building";

/// Line the fake executor prints on stderr.
pub const STDERR_MARKER: &str = "fake executor: diagnostics";

/// A fake executor script and the directory holding it.
#[derive(Debug)]
pub struct FakeExecutor {
    dir: TempDir,
    program: Utf8PathBuf,
}

impl FakeExecutor {
    /// Path of the executable script.
    #[must_use]
    pub fn program(&self) -> &Utf8Path {
        &self.program
    }

    /// Arguments of the most recent run, one per element.
    ///
    /// # Errors
    ///
    /// Returns an error if the executor has not run.
    pub fn recorded_args(&self) -> Result<Vec<String>> {
        let path = self.dir.path().join("args.log");
        let text = fs::read_to_string(&path).context("read recorded executor args")?;
        Ok(text.lines().map(ToOwned::to_owned).collect())
    }

    /// Working directory of the most recent run.
    ///
    /// # Errors
    ///
    /// Returns an error if the executor has not run.
    pub fn recorded_cwd(&self) -> Result<String> {
        let path = self.dir.path().join("cwd.log");
        let text = fs::read_to_string(&path).context("read recorded executor cwd")?;
        Ok(text.trim_end().to_owned())
    }
}

/// Create a fake executor that exits with `exit_code`.
///
/// # Errors
///
/// Returns an error if the script cannot be written or made executable.
pub fn fake_executor(exit_code: i32) -> Result<FakeExecutor> {
    let dir = TempDir::new().context("create executor dir")?;
    let root = Utf8Path::from_path(dir.path()).context("executor dir is not UTF-8")?;
    let program = root.join("fake-build-tool");
    let script = format!(
        "#!/bin/sh\n\
         printf '%s\\n' \"$@\" > '{root}/args.log'\n\
         pwd > '{root}/cwd.log'\n\
         echo '{STDOUT_MARKER}'\n\
         echo '{STDERR_MARKER}' >&2\n\
         exit {exit_code}\n"
    );
    fs::write(&program, script).context("write executor script")?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mut perms = fs::metadata(&program).context("stat script")?.permissions();
        perms.set_mode(0o755);
        fs::set_permissions(&program, perms).context("make script executable")?;
    }
    Ok(FakeExecutor { dir, program })
}

/// Holds `KUMIKI_BUILD_TOOL` pointed at a fake executor until dropped.
#[derive(Debug)]
pub struct ExecutorOverride {
    // Field order matters: the variable is restored before the lock is freed.
    _guard: crate::env_var_guard::EnvVarGuard,
    _lock: crate::env_lock::EnvLock,
}

/// Point `KUMIKI_BUILD_TOOL` at `executor` for the guard's lifetime.
#[must_use]
pub fn override_executor(executor: &FakeExecutor) -> ExecutorOverride {
    let lock = crate::env_lock::EnvLock::acquire();
    let guard = crate::env_var_guard::EnvVarGuard::set(
        executor_env::EXECUTOR_ENV,
        executor.program().as_str(),
    );
    ExecutorOverride {
        _guard: guard,
        _lock: lock,
    }
}

//! Executor subprocess handling.
//!
//! The executor reads the generated description and performs the build. Its
//! stdout and stderr are forwarded as they arrive and its exit status is
//! surfaced unchanged.

use camino::{Utf8Path, Utf8PathBuf};
use executor_env::{DEFAULT_EXECUTOR, EXECUTOR_ENV};
use std::{
    env,
    ffi::OsString,
    io::{self, BufReader},
    path::PathBuf,
    process::{Child, Command, ExitStatus, Stdio},
    thread,
};
use tracing::info;

use super::RunnerError;

mod streaming;

use streaming::{ForwardStats, forward_child_output};

fn resolve_executor_program_with<F>(mut read_env: F) -> Utf8PathBuf
where
    F: FnMut(&str) -> Option<OsString>,
{
    read_env(EXECUTOR_ENV)
        .and_then(|value| Utf8PathBuf::from_path_buf(PathBuf::from(value)).ok())
        .filter(|path| !path.as_str().is_empty())
        .unwrap_or_else(|| Utf8PathBuf::from(DEFAULT_EXECUTOR))
}

/// Executor program: `KUMIKI_BUILD_TOOL` when set, else `swift-build-tool`.
#[must_use]
pub fn resolve_executor_program() -> Utf8PathBuf {
    resolve_executor_program_with(|key| env::var_os(key))
}

/// One executor run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutorInvocation<'a> {
    /// Executor program.
    pub program: Utf8PathBuf,
    /// Directory the executor runs in.
    pub working_dir: &'a Utf8Path,
    /// Build description, relative to `working_dir` or absolute.
    pub build_file: &'a Utf8Path,
    /// Ask the executor to print every command.
    pub verbose: bool,
    /// Parallelism forwarded to the executor.
    pub jobs: Option<usize>,
    /// Targets to build; empty means the default target.
    pub targets: &'a [String],
}

impl ExecutorInvocation<'_> {
    /// Arguments passed to the executor, program excluded.
    #[must_use]
    pub fn args(&self) -> Vec<String> {
        let mut args = vec!["-f".to_owned(), self.build_file.to_string()];
        if self.verbose {
            args.push("-v".to_owned());
        }
        if let Some(jobs) = self.jobs {
            args.extend(["-j".to_owned(), jobs.to_string()]);
        }
        args.extend(self.targets.iter().cloned());
        args
    }
}

/// Run the executor to completion, streaming its output.
///
/// # Errors
///
/// Returns [`RunnerError::ExecutorSpawn`] if the process cannot be started or
/// waited on, and [`RunnerError::ExecutorFailed`] if it exits unsuccessfully.
pub fn run_executor(invocation: &ExecutorInvocation<'_>) -> Result<(), RunnerError> {
    let spawn_error = |source| RunnerError::ExecutorSpawn {
        program: invocation.program.clone(),
        source,
    };
    let args = invocation.args();
    let mut cmd = Command::new(invocation.program.as_std_path());
    cmd.args(&args)
        .current_dir(invocation.working_dir.as_std_path())
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    info!(
        "Running command: {} {}",
        invocation.program,
        args.join(" ")
    );

    let child = cmd.spawn().map_err(spawn_error)?;
    let status = spawn_and_stream_output(child).map_err(spawn_error)?;
    if status.success() {
        Ok(())
    } else {
        Err(RunnerError::ExecutorFailed {
            program: invocation.program.clone(),
            status,
        })
    }
}

fn handle_forwarding_thread_result(result: thread::Result<ForwardStats>, stream_name: &str) {
    match result {
        Ok(stats) if stats.write_failed => {
            tracing::debug!(
                bytes_read = stats.bytes_read,
                bytes_written = stats.bytes_written,
                "{stream_name} forwarding encountered closed pipe; output truncated"
            );
        }
        Ok(stats) => {
            tracing::debug!(
                bytes_read = stats.bytes_read,
                bytes_written = stats.bytes_written,
                "{stream_name} forwarding finished"
            );
        }
        Err(err) => {
            tracing::warn!("{stream_name} forwarding thread panicked: {err:?}");
        }
    }
}

fn spawn_and_stream_output(mut child: Child) -> io::Result<ExitStatus> {
    let Some(stdout) = child.stdout.take() else {
        terminate_child(&mut child, "stdout pipe unavailable");
        return Err(io::Error::other("child process missing stdout pipe"));
    };
    let Some(stderr) = child.stderr.take() else {
        terminate_child(&mut child, "stderr pipe unavailable");
        return Err(io::Error::other("child process missing stderr pipe"));
    };

    let out_handle = thread::spawn(move || {
        let mut lock = io::stdout().lock();
        forward_child_output(BufReader::new(stdout), &mut lock, "stdout")
    });
    let err_handle = thread::spawn(move || {
        let mut lock = io::stderr().lock();
        forward_child_output(BufReader::new(stderr), &mut lock, "stderr")
    });

    let status = child.wait()?;
    handle_forwarding_thread_result(out_handle.join(), "stdout");
    handle_forwarding_thread_result(err_handle.join(), "stderr");
    Ok(status)
}

fn terminate_child(child: &mut Child, context: &str) {
    if let Err(err) = child.kill() {
        tracing::debug!("failed to kill child after {context}: {err}");
    }
    if let Err(err) = child.wait() {
        tracing::debug!("failed to reap child after {context}: {err}");
    }
}

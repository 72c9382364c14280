//! Error types for the runner module.

// The unused_assignments lint fires on miette/thiserror derive expansion in
// some Rust versions but not others, so `#[expect]` cannot be used here.
// FIXME(rust-lang/rust#130021): remove once upstream is fixed.
#![allow(
    clippy::allow_attributes,
    clippy::allow_attributes_without_reason,
    unused_assignments
)]

use camino::Utf8PathBuf;
use miette::Diagnostic;
use std::io;
use std::process::ExitStatus;
use thiserror::Error;

/// Errors raised while locating the manifest or running the executor.
#[derive(Debug, Error, Diagnostic)]
pub enum RunnerError {
    /// The manifest file does not exist at the expected path.
    #[error("no manifest found at {path}")]
    #[diagnostic(
        code(kumiki::runner::manifest_not_found),
        help("create a {manifest_name} in {directory} or pass one with -f")
    )]
    ManifestNotFound {
        /// File name that was looked up, e.g. `Kumikifile`.
        manifest_name: String,
        /// Directory searched.
        directory: Utf8PathBuf,
        /// Full path attempted.
        path: Utf8PathBuf,
    },

    /// The executor ran and reported failure.
    #[error("{program} failed: {status}")]
    #[diagnostic(code(kumiki::runner::executor_failed))]
    ExecutorFailed {
        /// Executor program.
        program: Utf8PathBuf,
        /// Exit status reported by the executor.
        status: ExitStatus,
    },

    /// The executor could not be started.
    #[error("failed to start {program}")]
    #[diagnostic(
        code(kumiki::runner::executor_spawn),
        help("install swift-build-tool or point KUMIKI_BUILD_TOOL at an executor")
    )]
    ExecutorSpawn {
        /// Executor program.
        program: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
}

impl RunnerError {
    /// Exit code the process should use for this failure, when the executor
    /// supplied one.
    #[must_use]
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            Self::ExecutorFailed { status, .. } => status.code(),
            _ => None,
        }
    }
}

//! Error types for module resolution.

// The unused_assignments lint fires on miette/thiserror derive expansion in
// some Rust versions but not others, so `#[expect]` cannot be used here.
// FIXME(rust-lang/rust#130021): remove once upstream is fixed.
#![allow(
    clippy::allow_attributes,
    clippy::allow_attributes_without_reason,
    unused_assignments
)]

use miette::Diagnostic;
use thiserror::Error;

/// Errors raised while resolving declared modules into a [`super::ModuleGraph`].
#[derive(Debug, Error, Diagnostic)]
pub enum ResolveError {
    /// A module depends on itself, directly or transitively.
    #[error("dependency cycle detected: {}", cycle.join(" -> "))]
    #[diagnostic(
        code(kumiki::resolve::cycle),
        help("remove one of the dependencies along the cycle")
    )]
    DependencyCycle {
        /// Module names along the cycle, starting and ending with the same name.
        cycle: Vec<String>,
    },

    /// Scanning a module's source directory failed.
    #[error("failed to scan sources for module {module}")]
    #[diagnostic(code(kumiki::resolve::sources))]
    SourceScan {
        /// Module whose directory was being scanned.
        module: String,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
}

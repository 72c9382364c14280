//! Error types for task graph emission.

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

/// Errors raised when an emitted graph violates executor invariants.
#[derive(Debug, Error, Diagnostic)]
pub enum EmitError {
    /// Two nodes claim the same output.
    #[error("output {output} is produced by both {first} and {second}")]
    #[diagnostic(code(kumiki::graph::duplicate_output))]
    DuplicateOutput {
        /// Contested output.
        output: String,
        /// Node that claimed it first.
        first: String,
        /// Node that claimed it again.
        second: String,
    },

    /// A node depends on itself through its inputs.
    #[error("task graph contains a cycle: {}", cycle.join(" -> "))]
    #[diagnostic(code(kumiki::graph::cycle))]
    CircularNode {
        /// Node identifiers along the cycle, closed.
        cycle: Vec<String>,
    },

    /// A target lists a node that was never emitted.
    #[error("target {target:?} references unknown node {node}")]
    #[diagnostic(code(kumiki::graph::unknown_node))]
    UnknownNode {
        /// Target name.
        target: String,
        /// Missing node.
        node: String,
    },
}

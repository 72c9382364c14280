//! Kumiki core library.
//!
//! Kumiki reads a `Kumikifile` naming the modules of a source tree and their
//! dependencies, resolves the full module graph, and emits a task graph for
//! an llbuild-compatible executor. The pipeline stages are exposed as
//! separate modules so each can be used and tested on its own:
//!
//! - [`manifest`] parses the manifest into [`ast`] types;
//! - [`resolve`] infers implicit modules, discovers sources and computes link
//!   orders;
//! - [`graph`] turns resolved modules into build nodes;
//! - [`llbuild_gen`] renders the task graph and [`writer`] persists it;
//! - [`runner`] ties the stages to the [`cli`].

pub mod ast;
pub mod cli;
pub mod graph;
pub mod llbuild_gen;
pub mod manifest;
pub mod platform;
pub mod resolve;
pub mod runner;
pub mod status;
pub mod toolchain;
pub mod writer;

//! Task graph structures.
//!
//! The task graph is the executor-facing description of a build: nodes with
//! explicit inputs and outputs plus named target lists. It carries no
//! executor-specific syntax; [`crate::llbuild_gen`] renders it.
//!
//! # Examples
//!
//! ```
//! use kumiki::graph::{BuildNode, NodeId, TaskGraph, ToolKind};
//!
//! let group = NodeId::group("Core");
//! let node = BuildNode {
//!     id: group.clone(),
//!     tool: ToolKind::PhonyGroup,
//!     inputs: vec![NodeId::link("Core").into()],
//!     outputs: vec![group.clone().into()],
//!     command: None,
//! };
//! let mut graph = TaskGraph::default();
//! graph.nodes.insert(group.clone(), node);
//! graph.targets.insert("all".into(), vec![group]);
//! assert_eq!(graph.nodes.len(), 1);
//! ```

use camino::Utf8PathBuf;
use indexmap::IndexMap;
use serde::Serialize;
use std::borrow::Borrow;
use std::fmt;

mod emit;
mod error;
mod validate;

pub use emit::TaskGraphEmitter;
pub use error::EmitError;

/// Stable identifier of a build node.
///
/// Identifiers are wrapped in angle brackets so they can never collide with
/// file paths emitted by the same graph.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    /// Handle for "build module X".
    #[must_use]
    pub fn group(module: &str) -> Self {
        Self(format!("<{module}>"))
    }

    /// Ordering node that waits for a module's dependencies.
    #[must_use]
    pub fn order(module: &str) -> Self {
        Self(format!("<{module}-pred>"))
    }

    /// Source compilation node of a module.
    #[must_use]
    pub fn compile(module: &str) -> Self {
        Self(format!("<{module}-compile>"))
    }

    /// Archive or executable link node of a module.
    #[must_use]
    pub fn link(module: &str) -> Self {
        Self(format!("<{module}-link>"))
    }

    /// Borrow the identifier text.
    #[must_use]
    pub const fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<NodeId> for String {
    fn from(id: NodeId) -> Self {
        id.0
    }
}

impl Borrow<str> for NodeId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Kind of work a node performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ToolKind {
    /// Compile a module's sources.
    SourceCompile,
    /// Run a link or archive command.
    ShellLink,
    /// Stable per-module handle.
    PhonyGroup,
    /// Ordering-only node.
    PhonyOrder,
}

impl ToolKind {
    /// Whether the node runs no command.
    #[must_use]
    pub const fn is_phony(self) -> bool {
        matches!(self, Self::PhonyGroup | Self::PhonyOrder)
    }
}

/// Parameters for a source compilation node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompileSpec {
    /// Executor tool name, e.g. `swift-compiler`.
    pub tool_name: String,
    /// Compiler executable.
    pub executable: Utf8PathBuf,
    /// Module being compiled.
    pub module_name: String,
    /// Compiled module interface output.
    pub module_output_path: Utf8PathBuf,
    /// Whether the module is compiled as a library.
    pub is_library: bool,
    /// Sources, aligned with `objects`.
    pub sources: Vec<Utf8PathBuf>,
    /// Object files, one per source.
    pub objects: Vec<Utf8PathBuf>,
    /// Module search paths.
    pub import_paths: Vec<Utf8PathBuf>,
    /// Scratch directory for the compiler.
    pub temps_path: Utf8PathBuf,
    /// Remaining compiler arguments.
    pub other_args: Vec<String>,
}

/// Parameters for a link or archive node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LinkSpec {
    /// Human-readable summary shown by the executor.
    pub description: String,
    /// Command line, program first.
    pub args: Vec<String>,
}

/// Tool-specific command parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum CommandSpec {
    /// Compiler invocation.
    Compile(CompileSpec),
    /// Shell command producing an archive or executable.
    Link(LinkSpec),
}

/// One task in the graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildNode {
    /// Unique identifier.
    pub id: NodeId,
    /// Kind of work.
    pub tool: ToolKind,
    /// Node identifiers or file paths this node consumes.
    pub inputs: Vec<String>,
    /// Node identifiers or file paths this node produces, starting with `id`.
    pub outputs: Vec<String>,
    /// Command parameters; `None` for phony nodes.
    pub command: Option<CommandSpec>,
}

/// Complete task graph handed to the executor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TaskGraph {
    /// Named targets mapping to group nodes.
    pub targets: IndexMap<String, Vec<NodeId>>,
    /// Nodes in emission order.
    pub nodes: IndexMap<NodeId, BuildNode>,
}

impl TaskGraph {
    /// Look up a node by identifier.
    #[must_use]
    pub fn node(&self, id: &str) -> Option<&BuildNode> {
        self.nodes.get(id)
    }
}

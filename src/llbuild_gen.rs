//! llbuild description generator.
//!
//! Converts a [`crate::graph::TaskGraph`] into the YAML manifest read by
//! `swift-build-tool`. Nodes and targets keep their emission order, so the
//! same graph always renders to the same bytes and unchanged builds leave the
//! file on disk untouched.
//!
//! Scalars are written as JSON strings, which YAML accepts verbatim. This
//! sidesteps YAML's implicit typing for names such as `yes` or `1.0`.

use crate::graph::{BuildNode, CommandSpec, CompileSpec, LinkSpec, NodeId, TaskGraph, ToolKind};
use itertools::Itertools;
use std::fmt::{self, Display, Formatter};

/// Client name recorded in the description header.
pub const CLIENT_NAME: &str = "kumiki";

/// Tool name used for link and archive commands.
pub const SHELL_TOOL: &str = "shell";

/// Tool name used for group and ordering nodes.
pub const PHONY_TOOL: &str = "phony";

/// Render `graph` as an llbuild description.
///
/// # Examples
///
/// ```
/// use kumiki::graph::TaskGraph;
/// use kumiki::llbuild_gen::generate;
///
/// let text = generate(&TaskGraph::default());
/// assert!(text.starts_with("client:\n  name: kumiki\n"));
/// ```
#[must_use]
pub fn generate(graph: &TaskGraph) -> String {
    Description { graph }.to_string()
}

/// Quote `text` as a JSON string.
fn quote(text: &str) -> String {
    serde_json::Value::String(text.to_owned()).to_string()
}

/// Render a flow sequence of quoted scalars.
fn list<I>(items: I) -> String
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    format!("[{}]", items.into_iter().map(|i| quote(i.as_ref())).join(", "))
}

struct Description<'a> {
    graph: &'a TaskGraph,
}

impl Display for Description<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        writeln!(f, "client:")?;
        writeln!(f, "  name: {CLIENT_NAME}")?;
        writeln!(f)?;
        writeln!(f, "tools: {{}}")?;
        writeln!(f)?;
        writeln!(f, "targets:")?;
        for (name, ids) in &self.graph.targets {
            writeln!(f, "  {}: {}", quote(name), list(ids.iter().map(NodeId::as_str)))?;
        }
        writeln!(f)?;
        writeln!(f, "commands:")?;
        for node in self.graph.nodes.values() {
            write!(f, "{}", DisplayNode { node })?;
        }
        Ok(())
    }
}

struct DisplayNode<'a> {
    node: &'a BuildNode,
}

impl DisplayNode<'_> {
    fn tool(&self) -> &str {
        match (&self.node.tool, &self.node.command) {
            (ToolKind::SourceCompile, Some(CommandSpec::Compile(spec))) => spec.tool_name.as_str(),
            (kind, _) if kind.is_phony() => PHONY_TOOL,
            _ => SHELL_TOOL,
        }
    }
}

impl Display for DisplayNode<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let node = self.node;
        writeln!(f, "  {}:", quote(node.id.as_str()))?;
        writeln!(f, "    tool: {}", quote(self.tool()))?;
        match &node.command {
            Some(CommandSpec::Compile(spec)) => {
                writeln!(f, "    executable: {}", quote(spec.executable.as_str()))?;
                write_edges(f, node)?;
                write_compile(f, spec)
            }
            Some(CommandSpec::Link(spec)) => {
                writeln!(f, "    description: {}", quote(&spec.description))?;
                write_edges(f, node)?;
                write_link(f, spec)
            }
            None => write_edges(f, node),
        }
    }
}

fn write_edges(f: &mut Formatter<'_>, node: &BuildNode) -> fmt::Result {
    writeln!(f, "    inputs: {}", list(&node.inputs))?;
    writeln!(f, "    outputs: {}", list(&node.outputs))
}

fn write_compile(f: &mut Formatter<'_>, spec: &CompileSpec) -> fmt::Result {
    writeln!(f, "    module-name: {}", quote(&spec.module_name))?;
    writeln!(
        f,
        "    module-output-path: {}",
        quote(spec.module_output_path.as_str())
    )?;
    writeln!(f, "    is-library: {}", quote(&spec.is_library.to_string()))?;
    writeln!(f, "    sources: {}", list(&spec.sources))?;
    writeln!(f, "    objects: {}", list(&spec.objects))?;
    writeln!(f, "    import-paths: {}", list(&spec.import_paths))?;
    writeln!(f, "    temps-path: {}", quote(spec.temps_path.as_str()))?;
    writeln!(f, "    other-args: {}", list(&spec.other_args))
}

fn write_link(f: &mut Formatter<'_>, spec: &LinkSpec) -> fmt::Result {
    writeln!(f, "    args: {}", list(&spec.args))
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;
    use rstest::rstest;

    #[rstest]
    #[case("plain", "\"plain\"")]
    #[case("say \"hi\"", "\"say \\\"hi\\\"\"")]
    #[case("a\nb", "\"a\\nb\"")]
    #[case("yes", "\"yes\"")]
    fn scalars_are_json_quoted(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(quote(input), expected);
    }

    #[rstest]
    fn renders_phony_and_shell_nodes() {
        let group = NodeId::group("Core");
        let link = NodeId::link("Core");
        let mut graph = TaskGraph::default();
        graph.nodes.insert(
            link.clone(),
            BuildNode {
                id: link.clone(),
                tool: ToolKind::ShellLink,
                inputs: Vec::new(),
                outputs: vec![link.to_string(), "libCore.a".into()],
                command: Some(CommandSpec::Link(LinkSpec {
                    description: "Archiving libCore.a".into(),
                    args: vec!["/bin/sh".into(), "-c".into(), "ar cr libCore.a".into()],
                })),
            },
        );
        graph.nodes.insert(
            group.clone(),
            BuildNode {
                id: group.clone(),
                tool: ToolKind::PhonyGroup,
                inputs: vec![link.to_string()],
                outputs: vec![group.to_string()],
                command: None,
            },
        );
        graph.targets.insert("all".into(), vec![group]);

        let expected = concat!(
            "client:\n",
            "  name: kumiki\n",
            "\n",
            "tools: {}\n",
            "\n",
            "targets:\n",
            "  \"all\": [\"<Core>\"]\n",
            "\n",
            "commands:\n",
            "  \"<Core-link>\":\n",
            "    tool: \"shell\"\n",
            "    description: \"Archiving libCore.a\"\n",
            "    inputs: []\n",
            "    outputs: [\"<Core-link>\", \"libCore.a\"]\n",
            "    args: [\"/bin/sh\", \"-c\", \"ar cr libCore.a\"]\n",
            "  \"<Core>\":\n",
            "    tool: \"phony\"\n",
            "    inputs: [\"<Core-link>\"]\n",
            "    outputs: [\"<Core>\"]\n",
        );
        assert_eq!(generate(&graph), expected);
    }

    #[rstest]
    fn compile_node_uses_configured_tool_name() {
        let id = NodeId::compile("Core");
        let spec = CompileSpec {
            tool_name: "custom-compiler".into(),
            executable: Utf8PathBuf::from("swiftc"),
            module_name: "Core".into(),
            module_output_path: Utf8PathBuf::from("b/Core.swiftmodule"),
            is_library: true,
            sources: vec![Utf8PathBuf::from("Sources/Core/a.swift")],
            objects: vec![Utf8PathBuf::from("b/Core.build/a.swift.o")],
            import_paths: vec![Utf8PathBuf::from("b")],
            temps_path: Utf8PathBuf::from("b/Core.build"),
            other_args: vec!["-Onone".into()],
        };
        let mut graph = TaskGraph::default();
        graph.nodes.insert(
            id.clone(),
            BuildNode {
                id: id.clone(),
                tool: ToolKind::SourceCompile,
                inputs: Vec::new(),
                outputs: vec![id.to_string()],
                command: Some(CommandSpec::Compile(spec)),
            },
        );
        let text = generate(&graph);
        assert!(text.contains("    tool: \"custom-compiler\"\n    executable: \"swiftc\"\n"));
        assert!(text.contains("    is-library: \"true\"\n"));
        assert!(text.contains("    temps-path: \"b/Core.build\"\n"));
    }
}

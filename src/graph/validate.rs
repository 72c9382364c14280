//! Structural checks run on every emitted task graph.
//!
//! The executor schedules nodes in parallel from their input/output edges, so
//! each output must have a single producer and the producer relation must be
//! acyclic.

use std::collections::HashMap;

use super::{EmitError, TaskGraph};

/// Tracks the visitation state of a node during cycle detection.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum VisitState {
    Visiting,
    Visited,
}

pub(super) fn validate(graph: &TaskGraph) -> Result<(), EmitError> {
    let producers = producers(graph)?;
    check_targets(graph)?;
    let mut detector = CycleDetector::new(graph, &producers);
    for id in graph.nodes.keys() {
        if let Some(cycle) = detector.visit(id.as_str()) {
            return Err(EmitError::CircularNode { cycle });
        }
    }
    Ok(())
}

/// Map every output to the node producing it, rejecting duplicates.
fn producers(graph: &TaskGraph) -> Result<HashMap<&str, &str>, EmitError> {
    let mut producers: HashMap<&str, &str> = HashMap::new();
    for node in graph.nodes.values() {
        for output in &node.outputs {
            if let Some(first) = producers.insert(output.as_str(), node.id.as_str()) {
                return Err(EmitError::DuplicateOutput {
                    output: output.clone(),
                    first: first.to_owned(),
                    second: node.id.to_string(),
                });
            }
        }
    }
    Ok(producers)
}

fn check_targets(graph: &TaskGraph) -> Result<(), EmitError> {
    for (target, ids) in &graph.targets {
        if let Some(missing) = ids.iter().find(|id| !graph.nodes.contains_key(id.as_str())) {
            return Err(EmitError::UnknownNode {
                target: target.clone(),
                node: missing.to_string(),
            });
        }
    }
    Ok(())
}

struct CycleDetector<'a> {
    graph: &'a TaskGraph,
    producers: &'a HashMap<&'a str, &'a str>,
    stack: Vec<&'a str>,
    states: HashMap<&'a str, VisitState>,
}

impl<'a> CycleDetector<'a> {
    fn new(graph: &'a TaskGraph, producers: &'a HashMap<&'a str, &'a str>) -> Self {
        Self {
            graph,
            producers,
            stack: Vec::new(),
            states: HashMap::new(),
        }
    }

    fn visit(&mut self, node: &'a str) -> Option<Vec<String>> {
        match self.states.get(node).copied() {
            Some(VisitState::Visited) => return None,
            Some(VisitState::Visiting) => {
                let idx = self
                    .stack
                    .iter()
                    .position(|n| *n == node)
                    .unwrap_or_else(|| {
                        debug_assert!(false, "visiting node must be on the stack");
                        0
                    });
                let mut cycle: Vec<String> =
                    self.stack.iter().skip(idx).map(|n| (*n).to_owned()).collect();
                cycle.push(node.to_owned());
                return Some(cycle);
            }
            None => {
                self.states.insert(node, VisitState::Visiting);
            }
        }
        self.stack.push(node);

        let graph = self.graph;
        if let Some(build) = graph.nodes.get(node) {
            for input in &build.inputs {
                // Inputs nobody produces are source files.
                let Some(producer) = self.producers.get(input.as_str()).copied() else {
                    continue;
                };
                if let Some(cycle) = self.visit(producer) {
                    return Some(cycle);
                }
            }
        }

        self.stack.pop();
        self.states.insert(node, VisitState::Visited);
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{BuildNode, NodeId, ToolKind};

    fn phony(id: &str, inputs: &[&str], extra_outputs: &[&str]) -> (NodeId, BuildNode) {
        let node_id = NodeId::group(id);
        let mut outputs = vec![node_id.to_string()];
        outputs.extend(extra_outputs.iter().map(|o| (*o).to_owned()));
        let node = BuildNode {
            id: node_id.clone(),
            tool: ToolKind::PhonyGroup,
            inputs: inputs.iter().map(|i| (*i).to_owned()).collect(),
            outputs,
            command: None,
        };
        (node_id, node)
    }

    fn graph(nodes: Vec<(NodeId, BuildNode)>) -> TaskGraph {
        TaskGraph {
            targets: Default::default(),
            nodes: nodes.into_iter().collect(),
        }
    }

    #[test]
    fn accepts_chain_with_source_inputs() {
        let g = graph(vec![
            phony("a", &["src/a.swift"], &["out/a"]),
            phony("b", &["<a>", "out/a"], &[]),
        ]);
        assert!(validate(&g).is_ok());
    }

    #[test]
    fn rejects_duplicate_outputs() {
        let g = graph(vec![phony("a", &[], &["out/x"]), phony("b", &[], &["out/x"])]);
        match validate(&g) {
            Err(EmitError::DuplicateOutput { output, first, second }) => {
                assert_eq!(output, "out/x");
                assert_eq!(first, "<a>");
                assert_eq!(second, "<b>");
            }
            other => panic!("expected duplicate output, got {other:?}"),
        }
    }

    #[test]
    fn rejects_cycles() {
        let g = graph(vec![phony("a", &["<b>"], &[]), phony("b", &["<a>"], &[])]);
        match validate(&g) {
            Err(EmitError::CircularNode { cycle }) => {
                assert_eq!(cycle, vec!["<a>", "<b>", "<a>"]);
            }
            other => panic!("expected cycle, got {other:?}"),
        }
    }

    #[test]
    fn rejects_targets_naming_missing_nodes() {
        let mut g = graph(vec![phony("a", &[], &[])]);
        g.targets.insert("all".into(), vec![NodeId::group("a"), NodeId::group("ghost")]);
        match validate(&g) {
            Err(EmitError::UnknownNode { target, node }) => {
                assert_eq!(target, "all");
                assert_eq!(node, "<ghost>");
            }
            other => panic!("expected unknown node, got {other:?}"),
        }
    }
}

//! Per-module link order with cycle detection.
//!
//! The walk expands each dependency's own dependencies before recording the
//! dependency itself, then reverses the result so every module appears before
//! the modules it needs. Visit state is local to the module being resolved.

use std::collections::HashMap;

use indexmap::IndexMap;

use super::Module;

/// Tracks the visitation state of a module during one link-order walk.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum VisitState {
    Visiting,
    Visited,
}

struct LinkOrderWalker<'a> {
    modules: &'a IndexMap<String, Module>,
    states: HashMap<&'a str, VisitState>,
    stack: Vec<&'a str>,
    collected: Vec<String>,
}

impl<'a> LinkOrderWalker<'a> {
    fn new(modules: &'a IndexMap<String, Module>) -> Self {
        Self {
            modules,
            states: HashMap::new(),
            stack: Vec::new(),
            collected: Vec::new(),
        }
    }

    fn dependencies_of(&self, name: &str) -> &'a [String] {
        let modules = self.modules;
        modules
            .get(name)
            .map_or(&[][..], |module| module.declared_dependencies.as_slice())
    }

    fn visit(&mut self, name: &'a str) -> Result<(), Vec<String>> {
        self.states.insert(name, VisitState::Visiting);
        self.stack.push(name);

        for dep in self.dependencies_of(name) {
            match self.states.get(dep.as_str()).copied() {
                Some(VisitState::Visited) => {}
                Some(VisitState::Visiting) => return Err(self.cycle_through(dep)),
                None => {
                    self.visit(dep)?;
                    self.collected.push(dep.clone());
                }
            }
        }

        self.stack.pop();
        self.states.insert(name, VisitState::Visited);
        Ok(())
    }

    fn cycle_through(&self, node: &str) -> Vec<String> {
        let idx = self
            .stack
            .iter()
            .position(|n| *n == node)
            .unwrap_or_else(|| {
                debug_assert!(false, "visiting module must be on the stack");
                0
            });
        let mut cycle: Vec<String> = self
            .stack
            .iter()
            .skip(idx)
            .map(|n| (*n).to_owned())
            .collect();
        cycle.push(node.to_owned());
        canonicalize_cycle(cycle)
    }
}

/// Compute the link order for `root`.
///
/// Returns the offending cycle when `root` transitively depends on a module
/// that is still being expanded.
pub(super) fn link_order(
    root: &str,
    modules: &IndexMap<String, Module>,
) -> Result<Vec<String>, Vec<String>> {
    let Some((key, _)) = modules.get_key_value(root) else {
        return Ok(Vec::new());
    };
    let mut walker = LinkOrderWalker::new(modules);
    walker.visit(key)?;
    let mut order = walker.collected;
    order.reverse();
    Ok(order)
}

/// Rotate a closed cycle so it starts at its smallest member.
fn canonicalize_cycle(mut cycle: Vec<String>) -> Vec<String> {
    if cycle.len() < 2 {
        return cycle;
    }
    let len = cycle.len() - 1;
    let start = cycle
        .iter()
        .take(len)
        .enumerate()
        .min_by(|(_, a), (_, b)| a.cmp(b))
        .map_or(0, |(idx, _)| idx);
    let (prefix, suffix) = cycle.split_at_mut(len);
    prefix.rotate_left(start);
    if let (Some(first), Some(slot)) = (prefix.first().cloned(), suffix.first_mut()) {
        *slot = first;
    }
    cycle
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolve::ModuleOrigin;
    use rstest::rstest;

    fn graph(edges: &[(&str, &[&str])]) -> IndexMap<String, Module> {
        edges
            .iter()
            .map(|(name, deps)| {
                let module = Module {
                    name: (*name).to_owned(),
                    declared_dependencies: deps.iter().map(|d| (*d).to_owned()).collect(),
                    link_order: Vec::new(),
                    sources: Vec::new(),
                    is_executable: false,
                    link_libraries: Vec::new(),
                    compile_flags: Vec::new(),
                    origin: ModuleOrigin::Declared,
                };
                ((*name).to_owned(), module)
            })
            .collect()
    }

    #[rstest]
    #[case("Top", &["Mid", "Leaf"])]
    #[case("Mid", &["Leaf"])]
    #[case("Leaf", &[])]
    fn chain_orders_nearest_dependency_first(#[case] root: &str, #[case] expected: &[&str]) {
        let modules = graph(&[("Leaf", &[]), ("Mid", &["Leaf"]), ("Top", &["Mid"])]);
        assert_eq!(link_order(root, &modules), Ok(expected.iter().map(|s| (*s).to_owned()).collect()));
    }

    #[test]
    fn diamond_lists_shared_dependency_once_and_last() {
        let modules = graph(&[
            ("C", &[]),
            ("A", &["C"]),
            ("B", &["C"]),
            ("App", &["A", "B"]),
        ]);
        let order = link_order("App", &modules).expect("acyclic");
        assert_eq!(order, vec!["B", "A", "C"]);
    }

    #[test]
    fn repeated_dependency_is_listed_once() {
        let modules = graph(&[("Core", &[]), ("App", &["Core", "Core"])]);
        assert_eq!(link_order("App", &modules), Ok(vec!["Core".to_owned()]));
    }

    #[test]
    fn two_node_cycle_is_reported() {
        let modules = graph(&[("A", &["B"]), ("B", &["A"])]);
        assert_eq!(
            link_order("B", &modules),
            Err(vec!["A".to_owned(), "B".to_owned(), "A".to_owned()])
        );
    }

    #[test]
    fn self_dependency_is_a_cycle() {
        let modules = graph(&[("A", &["A"])]);
        assert_eq!(
            link_order("A", &modules),
            Err(vec!["A".to_owned(), "A".to_owned()])
        );
    }

    #[test]
    fn cycle_below_root_is_reported() {
        let modules = graph(&[("Top", &["X"]), ("X", &["Y"]), ("Y", &["X"])]);
        assert_eq!(
            link_order("Top", &modules),
            Err(vec!["X".to_owned(), "Y".to_owned(), "X".to_owned()])
        );
    }

    #[test]
    fn canonicalize_cycle_rotates_smallest_node() {
        let cycle = vec!["c".to_owned(), "a".to_owned(), "b".to_owned(), "c".to_owned()];
        assert_eq!(canonicalize_cycle(cycle), vec!["a", "b", "c", "a"]);
    }
}

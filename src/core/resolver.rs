//! Run-order resolution
//!
//! Orders composed recipes so that every recipe runs after the recipes it
//! depends on, and detects cycles in nested declarations.

use std::collections::{BTreeMap, BTreeSet};

use crate::error::ResolverError;

/// Dependency graph over recipe keys
///
/// Ordered collections keep the computed run order stable between runs.
#[derive(Debug, Default)]
pub struct DependencyGraph {
    /// Adjacency list: recipe -> recipes that must run first
    edges: BTreeMap<String, BTreeSet<String>>,
    nodes: BTreeSet<String>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node without dependencies
    pub fn add_node(&mut self, name: &str) {
        self.nodes.insert(name.to_string());
    }

    /// Record that `name` must run after `dependency`
    pub fn add_edge(&mut self, name: &str, dependency: &str) {
        self.add_node(name);
        self.add_node(dependency);
        self.edges
            .entry(name.to_string())
            .or_default()
            .insert(dependency.to_string());
    }

    /// Dependencies before dependents
    pub fn topological_sort(&self) -> Result<Vec<String>, ResolverError> {
        let mut visited = BTreeSet::new();
        let mut in_progress = BTreeSet::new();
        let mut result = Vec::new();
        let mut path = Vec::new();

        for node in &self.nodes {
            if !visited.contains(node) {
                self.visit(node, &mut visited, &mut in_progress, &mut result, &mut path)?;
            }
        }

        Ok(result)
    }

    fn visit(
        &self,
        node: &str,
        visited: &mut BTreeSet<String>,
        in_progress: &mut BTreeSet<String>,
        result: &mut Vec<String>,
        path: &mut Vec<String>,
    ) -> Result<(), ResolverError> {
        if in_progress.contains(node) {
            path.push(node.to_string());
            return Err(ResolverError::CircularDependency { cycle: path.clone() });
        }

        if visited.contains(node) {
            return Ok(());
        }

        in_progress.insert(node.to_string());
        path.push(node.to_string());

        if let Some(deps) = self.edges.get(node) {
            for dep in deps {
                self.visit(dep, visited, in_progress, result, path)?;
            }
        }

        path.pop();
        in_progress.remove(node);
        visited.insert(node.to_string());
        result.push(node.to_string());

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn position(order: &[String], name: &str) -> usize {
        order.iter().position(|x| x == name).unwrap()
    }

    #[test]
    fn test_dependencies_run_first() {
        let mut graph = DependencyGraph::new();
        graph.add_edge("nova", "libnova");
        graph.add_edge("nova-test", "nova");

        let order = graph.topological_sort().unwrap();
        assert!(position(&order, "libnova") < position(&order, "nova"));
        assert!(position(&order, "nova") < position(&order, "nova-test"));
    }

    #[test]
    fn test_isolated_node_is_included() {
        let mut graph = DependencyGraph::new();
        graph.add_node("solo");
        assert_eq!(graph.topological_sort().unwrap(), vec!["solo".to_string()]);
    }

    #[test]
    fn test_order_is_stable() {
        let build = || {
            let mut graph = DependencyGraph::new();
            graph.add_edge("c", "a");
            graph.add_edge("c", "b");
            graph.add_node("d");
            graph.topological_sort().unwrap()
        };
        assert_eq!(build(), build());
        assert_eq!(build(), vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn test_cycle_reports_path() {
        let mut graph = DependencyGraph::new();
        graph.add_edge("a", "b");
        graph.add_edge("b", "c");
        graph.add_edge("c", "a");

        match graph.topological_sort() {
            Err(ResolverError::CircularDependency { cycle }) => {
                assert_eq!(cycle.first(), cycle.last());
                assert_eq!(cycle.len(), 4);
            }
            other => panic!("Expected CircularDependency, got {other:?}"),
        }
    }
}

//! Dependency graph using petgraph.
//!
//! Stores file dependencies as a directed graph where edge A→B means "A imports B".
//! Each edge is labelled with the specifier A used. The graph is built once per
//! run and only read afterwards; nodes are never removed.

use super::resolver::ModuleResolver;
use petgraph::stable_graph::{NodeIndex, StableDiGraph};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Default node limit before the graph stops growing.
pub const DEFAULT_MAX_GRAPH_NODES: usize = 10_000;

/// A node in the dependency graph.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum GraphNode {
    /// A module file, keyed by canonical path.
    Module(PathBuf),
}

impl GraphNode {
    fn path(&self) -> &Path {
        match self {
            GraphNode::Module(p) => p,
        }
    }
}

/// Dependency graph storing file import relationships.
pub struct DepGraph {
    graph: StableDiGraph<GraphNode, String>,
    path_to_idx: HashMap<PathBuf, NodeIndex>,
    max_nodes: usize,
    overflow: bool,
}

impl Default for DepGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl DepGraph {
    /// Create a new empty dependency graph.
    pub fn new() -> Self {
        Self::with_max_nodes(DEFAULT_MAX_GRAPH_NODES)
    }

    /// Create a graph that overflows past `max_nodes` nodes.
    pub fn with_max_nodes(max_nodes: usize) -> Self {
        Self {
            graph: StableDiGraph::new(),
            path_to_idx: HashMap::new(),
            max_nodes,
            overflow: false,
        }
    }

    /// Add a file to the graph. Returns the node index.
    /// Past the node limit, sets the overflow flag and returns None.
    pub fn add_file(&mut self, path: PathBuf) -> Option<NodeIndex> {
        if let Some(&idx) = self.path_to_idx.get(&path) {
            return Some(idx);
        }

        if self.graph.node_count() >= self.max_nodes {
            if !self.overflow {
                warn!("graph exceeded {} nodes, related queries fall back to all tests", self.max_nodes);
                self.overflow = true;
            }
            return None;
        }

        let idx = self.graph.add_node(GraphNode::Module(path.clone()));
        self.path_to_idx.insert(path, idx);
        Some(idx)
    }

    /// Resolve `specifier` from `from` and record the edge.
    ///
    /// Unresolvable specifiers are dropped. Returns whether an edge was recorded.
    pub fn add_edge(&mut self, from: &Path, specifier: &str, resolver: &impl ModuleResolver) -> bool {
        let Some(to) = resolver.resolve(from, specifier) else {
            return false;
        };
        self.add_resolved_edge(from, specifier, to)
    }

    /// Record `from --specifier--> to` for an already resolved import.
    pub fn add_resolved_edge(&mut self, from: &Path, specifier: &str, to: PathBuf) -> bool {
        let Some(from_idx) = self.add_file(from.to_path_buf()) else {
            return false;
        };
        let Some(to_idx) = self.add_file(to) else {
            return false;
        };

        let duplicate = self
            .graph
            .edges_connecting(from_idx, to_idx)
            .any(|e| e.weight() == specifier);
        if !duplicate {
            self.graph.add_edge(from_idx, to_idx, specifier.to_string());
        }
        true
    }

    /// Get all files that directly depend on (import) the given file.
    pub fn get_dependents(&self, path: &Path) -> Vec<PathBuf> {
        let Some(&idx) = self.path_to_idx.get(path) else {
            return Vec::new();
        };

        let mut dependents: Vec<PathBuf> = self
            .graph
            .edges_directed(idx, Direction::Incoming)
            .filter_map(|e| self.graph.node_weight(e.source()))
            .map(|node| node.path().to_path_buf())
            .collect();
        dependents.sort();
        dependents.dedup();
        dependents
    }

    /// Check if graph has overflowed.
    pub fn is_overflow(&self) -> bool {
        self.overflow
    }

    /// Get current node count.
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Get current edge count.
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Check if graph contains a file.
    pub fn contains(&self, path: &Path) -> bool {
        self.path_to_idx.contains_key(path)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    /// Resolves `./name` to `/src/name.ts`; anything else is unresolved.
    struct FlatResolver;

    impl ModuleResolver for FlatResolver {
        fn resolve(&self, _from: &Path, specifier: &str) -> Option<PathBuf> {
            let name = specifier.strip_prefix("./")?;
            Some(PathBuf::from(format!("/src/{name}.ts")))
        }
    }

    #[test]
    fn add_file_idempotent() {
        let mut graph = DepGraph::new();
        let path = PathBuf::from("/src/foo.ts");
        let idx1 = graph.add_file(path.clone());
        let idx2 = graph.add_file(path.clone());
        assert!(idx1.is_some());
        assert_eq!(idx1, idx2);
        assert!(graph.contains(&path));
        assert_eq!(graph.node_count(), 1);
    }

    #[test]
    fn add_edge_records_both_directions() {
        let mut graph = DepGraph::new();
        let a = PathBuf::from("/src/a.ts");
        let b = PathBuf::from("/src/b.ts");

        assert!(graph.add_edge(&a, "./b", &FlatResolver));

        assert_eq!(graph.edge_count(), 1);
        assert_eq!(graph.get_dependents(&b), vec![a.clone()]);
        assert!(graph.contains(&b));
    }

    #[test]
    fn unresolved_import_is_dropped() {
        let mut graph = DepGraph::new();
        let a = PathBuf::from("/src/a.ts");

        assert!(!graph.add_edge(&a, "lodash", &FlatResolver));
        assert_eq!(graph.edge_count(), 0);
        assert_eq!(graph.node_count(), 0);
    }

    #[test]
    fn same_specifier_twice_is_one_edge() {
        let mut graph = DepGraph::new();
        let a = PathBuf::from("/src/a.ts");

        graph.add_edge(&a, "./b", &FlatResolver);
        graph.add_edge(&a, "./b", &FlatResolver);
        assert_eq!(graph.edge_count(), 1);
    }

    #[test]
    fn two_specifiers_for_one_target_list_dependent_once() {
        let mut graph = DepGraph::new();
        let a = PathBuf::from("/src/a.ts");
        let b = PathBuf::from("/src/b.ts");

        graph.add_resolved_edge(&a, "./b", b.clone());
        graph.add_resolved_edge(&a, "./b.ts", b.clone());

        assert_eq!(graph.edge_count(), 2);
        assert_eq!(graph.get_dependents(&b), vec![a.clone()]);
    }

    #[test]
    fn get_dependents_returns_importers() {
        let mut graph = DepGraph::new();
        let util = PathBuf::from("/src/util.ts");
        let importers: Vec<PathBuf> = ["a", "b", "c"]
            .iter()
            .map(|n| PathBuf::from(format!("/src/{n}.ts")))
            .collect();

        for importer in &importers {
            graph.add_edge(importer, "./util", &FlatResolver);
        }

        assert_eq!(graph.get_dependents(&util), importers);
    }

    #[test]
    fn get_dependents_of_unknown_file_is_empty() {
        let graph = DepGraph::new();
        assert!(graph.get_dependents(Path::new("/src/none.ts")).is_empty());
    }

    #[test]
    fn overflow_at_max_nodes() {
        let mut graph = DepGraph::with_max_nodes(3);

        for i in 0..3 {
            assert!(graph.add_file(PathBuf::from(format!("/src/file{i}.ts"))).is_some());
        }
        assert!(!graph.is_overflow());

        assert!(graph.add_file(PathBuf::from("/src/extra.ts")).is_none());
        assert!(graph.is_overflow());
        assert_eq!(graph.node_count(), 3);
    }

    #[test]
    fn edge_past_overflow_is_not_recorded() {
        let mut graph = DepGraph::with_max_nodes(1);
        let a = PathBuf::from("/src/a.ts");

        assert!(!graph.add_edge(&a, "./b", &FlatResolver));
        assert!(graph.is_overflow());
        assert_eq!(graph.edge_count(), 0);
    }
}

//! Transitive dependents using reverse BFS.

use super::graph::DepGraph;
use std::collections::{HashSet, VecDeque};
use std::path::PathBuf;

/// Compute every file that reaches a seed through import edges.
///
/// Seeds present in the graph are part of the result. Seeds the graph does
/// not know contribute nothing. Each node is visited once, so cycles terminate.
pub fn transitive_dependents(seeds: &HashSet<PathBuf>, graph: &DepGraph) -> HashSet<PathBuf> {
    let mut reached = HashSet::new();
    let mut queue = VecDeque::new();

    for path in seeds {
        if graph.contains(path) && reached.insert(path.clone()) {
            queue.push_back(path.clone());
        }
    }

    while let Some(current) = queue.pop_front() {
        for dependent in graph.get_dependents(&current) {
            if reached.insert(dependent.clone()) {
                queue.push_back(dependent);
            }
        }
    }

    reached
}

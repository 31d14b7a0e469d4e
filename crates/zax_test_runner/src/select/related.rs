//! Related-files resolution.
//!
//! Maps source files named by the caller to the test files that depend on
//! them, directly or transitively.

use super::test_set::TestFileSet;
use crate::affected::{transitive_dependents, DepGraph, TestDiscovery};
use crate::normalize::truncate_for_log;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Outcome of a related-files query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelatedTests {
    pub tests: TestFileSet,
    /// The caller's specifiers joined with `|`, verbatim.
    pub fragment: String,
}

/// Find the discovered test files that depend on any of `specifiers`.
///
/// Relative specifiers are taken from the project root. Specifiers naming no
/// existing file contribute nothing. Results follow discovery order. If the
/// graph overflowed, every discovered test is returned.
pub fn find_related_tests(specifiers: &[String], graph: &DepGraph, discovery: &TestDiscovery) -> RelatedTests {
    let fragment = specifiers.join("|");

    if graph.is_overflow() {
        warn!("dependency graph incomplete, running all tests for {fragment}");
        return RelatedTests { tests: discovery.tests().iter().cloned().collect(), fragment };
    }

    let seeds: HashSet<PathBuf> = specifiers
        .iter()
        .filter_map(|spec| resolve_seed(spec, discovery.root()))
        .collect();

    let reached = transitive_dependents(&seeds, graph);
    let tests: TestFileSet = discovery
        .tests()
        .iter()
        .filter(|p| reached.contains(*p))
        .cloned()
        .collect();

    debug!("seeds={}, reached={}, tests={}", seeds.len(), reached.len(), tests.len());
    RelatedTests { tests, fragment }
}

fn resolve_seed(specifier: &str, root: &Path) -> Option<PathBuf> {
    let path = Path::new(specifier);
    let joined = if path.is_absolute() { path.to_path_buf() } else { root.join(path) };
    match joined.canonicalize() {
        Ok(canonical) => Some(canonical),
        Err(_) => {
            debug!("related file {} does not exist", truncate_for_log(&joined));
            None
        }
    }
}

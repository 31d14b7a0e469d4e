//! Project snapshot.
//!
//! Walks the project once, classifies test files and builds the dependency
//! graph. The snapshot is read-only afterwards; watch mode builds a new one
//! for every batch of changes.

use crate::affected::discovery::walk_project_files;
use crate::affected::parser::is_parseable;
use crate::affected::{DepGraph, ImportParser, PathResolver, TestClassifier, TestDiscovery};
use crate::config::RunnerConfig;
use crate::error::{Error, Result};
use crate::select::{Selection, SelectionCriterion, Selector};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::info;

pub struct Project {
    root: PathBuf,
    config: RunnerConfig,
    graph: DepGraph,
    discovery: TestDiscovery,
}

impl Project {
    /// Build the snapshot for `root`.
    ///
    /// # Errors
    /// Returns `Error::Io` if `root` does not exist, `Error::InvalidPattern`
    /// for a bad `testRegex` or ignore pattern, and `Error::Query` if the
    /// import queries do not compile.
    pub fn load(root: &Path, config: RunnerConfig) -> Result<Self> {
        let root = root.canonicalize().map_err(|e| Error::io(root, e))?;
        let start = Instant::now();
        info!("building project snapshot for {}", root.display());

        let classifier = TestClassifier::new(config.test_regex.as_deref(), &config.test_path_ignore_patterns)?;
        let files = walk_project_files(&root);
        let discovery = TestDiscovery::from_files(&root, &files, &classifier);

        let resolver = PathResolver::new(
            &root,
            &config.module_file_extensions,
            Some(config.tsconfig_path(&root)),
        );
        let mut parser = ImportParser::new()?;
        let mut graph = DepGraph::with_max_nodes(config.max_graph_nodes);
        let mut file_count = 0;

        for path in files.iter().filter(|p| is_parseable(p)) {
            if graph.add_file(path.clone()).is_none() {
                break;
            }
            for specifier in parser.parse_file(path) {
                graph.add_edge(path, &specifier, &resolver);
            }
            file_count += 1;
        }

        info!(
            "graph build complete: {} files, {} nodes, {} edges, {} tests in {}ms",
            file_count,
            graph.node_count(),
            graph.edge_count(),
            discovery.len(),
            start.elapsed().as_millis()
        );

        Ok(Self { root, config, graph, discovery })
    }

    /// Canonical project root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    pub fn graph(&self) -> &DepGraph {
        &self.graph
    }

    pub fn discovery(&self) -> &TestDiscovery {
        &self.discovery
    }

    pub fn selector(&self) -> Selector<'_> {
        Selector::new(&self.graph, &self.discovery, self.config.combine_mode)
    }

    pub fn select(&self, criteria: &[SelectionCriterion]) -> Selection {
        self.selector().select(criteria)
    }
}

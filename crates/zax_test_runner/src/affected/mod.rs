//! Dependency tracking for test selection.
//!
//! Provides import parsing, module resolution, the dependency graph, reverse
//! reachability, test discovery and file watching.

pub mod compute;
pub mod discovery;
pub mod graph;
pub mod parser;
pub mod resolver;
pub mod watcher;

pub use compute::transitive_dependents;
pub use discovery::{is_test_file, TestClassifier, TestDiscovery};
pub use graph::DepGraph;
pub use parser::ImportParser;
pub use resolver::{ModuleResolver, PathResolver};

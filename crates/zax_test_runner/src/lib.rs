//! Test selection and running for JavaScript/TypeScript projects.
//!
//! Builds a dependency graph of the project's modules, selects test files by
//! path pattern or by relation to changed source files, runs them and
//! reports a summary.

pub mod affected;
pub mod cli;
pub mod config;
pub mod error;
pub mod normalize;
pub mod project;
pub mod run;
pub mod select;
pub mod session;
pub mod watch;

pub use config::{ConfigOverrides, RunnerConfig};
pub use error::{Error, ExitCode, Result};
pub use project::Project;
pub use run::{CommandExecutor, Executor, Reporter, RunResult, RunStatus, RunSummary};
pub use select::{CombineMode, Criteria, PathMatcher, Selection, SelectionCriterion, Selector, TestFileSet};
pub use session::Session;

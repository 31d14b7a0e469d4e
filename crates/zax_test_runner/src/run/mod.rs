//! Test execution and reporting.

pub mod executor;
pub mod reporter;

pub use executor::{CommandExecutor, Executor, RunResult, RunStatus};
pub use reporter::{Reporter, RunSummary};

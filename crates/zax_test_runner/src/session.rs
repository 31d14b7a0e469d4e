//! One invocation of the runner: where the project lives, how it is
//! configured, and the shared cancellation flag.

use crate::config::{ConfigOverrides, RunnerConfig};
use crate::error::{Error, Result};
use crate::project::Project;
use crate::run::{CommandExecutor, Executor, Reporter, RunSummary};
use crate::select::SelectionCriterion;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct Session {
    root: PathBuf,
    config_path: Option<PathBuf>,
    overrides: ConfigOverrides,
    cancel: Arc<AtomicBool>,
}

impl Session {
    pub fn new(root: PathBuf, config_path: Option<PathBuf>, overrides: ConfigOverrides) -> Self {
        Self { root, config_path, overrides, cancel: Arc::new(AtomicBool::new(false)) }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }

    /// Flag checked before each test file starts.
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.load(Ordering::SeqCst)
    }

    /// Read configuration and build a fresh project snapshot.
    ///
    /// # Errors
    /// Propagates configuration and snapshot errors.
    pub fn load(&self) -> Result<Project> {
        let config = RunnerConfig::load_with(&self.root, self.config_path.as_deref(), &self.overrides)?;
        Project::load(&self.root, config)
    }

    /// The executor configured for `project`.
    ///
    /// # Errors
    /// Returns `Error::Config` for an unusable `testCommand`.
    pub fn executor(&self, project: &Project) -> Result<CommandExecutor> {
        let config = project.config();
        CommandExecutor::new(&config.test_command, project.root(), config.timeout())
    }

    /// Select for `criteria` and run the selection with `executor`.
    ///
    /// # Errors
    /// Returns `Error::Report` if `out` or `err` cannot be written.
    pub async fn run<X, O, E>(
        &self,
        project: &Project,
        criteria: &[SelectionCriterion],
        executor: Arc<X>,
        out: O,
        err: E,
    ) -> Result<RunSummary>
    where
        X: Executor,
        O: Write,
        E: Write,
    {
        let selection = project.select(criteria);
        let mut reporter = Reporter::new(project.root().to_path_buf(), out, err)
            .with_max_workers(project.config().workers());
        reporter
            .run(&selection, executor, self.cancel_flag())
            .await
            .map_err(Error::Report)
    }
}

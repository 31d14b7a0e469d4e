//! Run summary reporting.
//!
//! Dispatches every selected file, prints `PASS`/`FAIL` lines as results come
//! back, and closes with the summary. The line formats are matched verbatim
//! by downstream tooling.

use super::executor::{Executor, RunResult, RunStatus};
use crate::error::ExitCode;
use crate::normalize::relative_display;
use crate::select::Selection;
use std::collections::HashSet;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{info, warn};

/// Aggregated results of one run.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    /// In completion order.
    pub results: Vec<RunResult>,
    /// Number of files selected.
    pub selected: usize,
    /// Cancellation stopped some files from being dispatched.
    pub interrupted: bool,
}

impl RunSummary {
    pub fn passed(&self) -> usize {
        self.count(RunStatus::Passed)
    }

    pub fn failed(&self) -> usize {
        self.count(RunStatus::Failed)
    }

    pub fn errored(&self) -> usize {
        self.count(RunStatus::Errored)
    }

    fn count(&self, status: RunStatus) -> usize {
        self.results.iter().filter(|r| r.status == status).count()
    }

    /// Process exit status for this run.
    ///
    /// An uninterrupted run with fewer results than selected files failed.
    pub fn exit_code(&self, pass_with_no_tests: bool) -> ExitCode {
        if self.interrupted {
            ExitCode::Interrupted
        } else if self.selected == 0 {
            if pass_with_no_tests {
                ExitCode::Success
            } else {
                ExitCode::TestsFailed
            }
        } else if self.results.len() == self.selected && self.results.iter().all(RunResult::is_passed) {
            ExitCode::Success
        } else {
            ExitCode::TestsFailed
        }
    }

    fn tally(&self) -> String {
        let mut parts = Vec::new();
        for (count, label) in [
            (self.failed(), "failed"),
            (self.errored(), "errored"),
            (self.passed(), "passed"),
        ] {
            if count > 0 {
                parts.push(format!("{count} {label}"));
            }
        }
        if self.interrupted {
            parts.push(format!("{} of {} total", self.results.len(), self.selected));
        } else {
            parts.push(format!("{} total", self.selected));
        }
        format!("Test Suites: {}", parts.join(", "))
    }
}

/// Writes run progress and the summary.
///
/// `out` receives the no-match report, `err` everything else.
pub struct Reporter<O: Write, E: Write> {
    root: PathBuf,
    out: O,
    err: E,
    max_workers: usize,
}

impl<O: Write, E: Write> Reporter<O, E> {
    pub fn new(root: PathBuf, out: O, err: E) -> Self {
        Self { root, out, err, max_workers: 1 }
    }

    /// Bound the number of files executing at once.
    #[must_use]
    pub fn with_max_workers(mut self, max_workers: usize) -> Self {
        self.max_workers = max_workers.max(1);
        self
    }

    /// Execute `selection` and report.
    ///
    /// Once `cancel` is set no further file starts; files already running
    /// finish and are reported.
    ///
    /// # Errors
    /// Returns an error only when writing to the output streams fails.
    pub async fn run<X: Executor>(
        &mut self,
        selection: &Selection,
        executor: Arc<X>,
        cancel: Arc<AtomicBool>,
    ) -> io::Result<RunSummary> {
        let mut summary = RunSummary { selected: selection.tests.len(), ..RunSummary::default() };

        if selection.tests.is_empty() {
            self.report_no_tests(selection)?;
            return Ok(summary);
        }

        let started = Instant::now();
        let permits = Arc::new(Semaphore::new(self.max_workers));
        let mut tasks = JoinSet::new();
        let mut pending: HashSet<PathBuf> = selection.tests.iter().cloned().collect();

        for path in &selection.tests {
            let path = path.clone();
            let permits = Arc::clone(&permits);
            let executor = Arc::clone(&executor);
            let cancel = Arc::clone(&cancel);
            tasks.spawn(async move {
                let Ok(_permit) = permits.acquire_owned().await else {
                    return (path, None);
                };
                if cancel.load(Ordering::SeqCst) {
                    return (path, None);
                }
                let result = execute_isolated(executor, path.clone()).await;
                (path, Some(result))
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((path, outcome)) => {
                    pending.remove(&path);
                    match outcome {
                        Some(result) => {
                            self.report_result(&result)?;
                            summary.results.push(result);
                        }
                        None => summary.interrupted = true,
                    }
                }
                Err(e) => warn!("test task failed to join: {e}"),
            }
        }

        // Files whose task died without reporting still count against the run.
        for path in selection.tests.iter().filter(|p| pending.contains(*p)) {
            let result = RunResult::errored(path.clone(), "test task ended without a result", started.elapsed());
            self.report_result(&result)?;
            summary.results.push(result);
        }

        self.report_summary(selection, &summary)?;
        info!(
            "ran {} of {} files in {}ms",
            summary.results.len(),
            summary.selected,
            started.elapsed().as_millis()
        );
        Ok(summary)
    }

    fn report_no_tests(&mut self, selection: &Selection) -> io::Result<()> {
        writeln!(self.out, "No tests found")?;
        if !selection.criteria.is_all() {
            writeln!(self.out, "Pattern: {} - 0 matches", selection.description())?;
        }
        self.out.flush()
    }

    fn report_result(&mut self, result: &RunResult) -> io::Result<()> {
        let label = if result.is_passed() { "PASS" } else { "FAIL" };
        writeln!(self.err, "{label} {}", relative_display(&result.path, &self.root))?;
        if let Some(message) = &result.message {
            for line in message.lines() {
                writeln!(self.err, "  {line}")?;
            }
        }
        self.err.flush()
    }

    fn report_summary(&mut self, selection: &Selection, summary: &RunSummary) -> io::Result<()> {
        if summary.interrupted {
            writeln!(self.err, "Test run was interrupted.")?;
        }
        writeln!(self.err, "{}", summary.tally())?;
        writeln!(self.err, "Ran all test suites{}.", selection.criteria.summary_qualifier())?;
        self.err.flush()
    }
}

/// Run one file on its own task so a panicking executor only errors that file.
async fn execute_isolated<X: Executor>(executor: Arc<X>, path: PathBuf) -> RunResult {
    let started = Instant::now();
    let inner_path = path.clone();
    let handle = tokio::spawn(async move { executor.execute(inner_path).await });
    match handle.await {
        Ok(result) => result,
        Err(e) => RunResult::errored(path, &format!("executor crashed: {e}"), started.elapsed()),
    }
}

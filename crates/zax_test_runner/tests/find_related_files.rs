//! Related-files selection end to end: snapshot, selection and report.

#![allow(clippy::unwrap_used, clippy::panic)]

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tempfile::{tempdir, TempDir};
use zax_test_runner::{
    ConfigOverrides, Executor, ExitCode, PathMatcher, RunResult, RunSummary, SelectionCriterion, Session,
};

/// Passes every file without spawning anything.
struct PassingExecutor;

impl Executor for PassingExecutor {
    async fn execute(&self, path: PathBuf) -> RunResult {
        RunResult::passed(path, Duration::ZERO)
    }
}

fn write_files(root: &Path, files: &[(&str, &str)]) {
    for (rel, content) in files {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }
}

/// `__tests__/test.test.js` requires `../a`.
fn project() -> TempDir {
    let dir = tempdir().unwrap();
    write_files(
        dir.path(),
        &[
            ("__tests__/test.test.js", "const a = require('../a');\ntest('a', () => {});\n"),
            ("a.js", "module.exports = {};\n"),
            ("package.json", r#"{"name": "find-related"}"#),
        ],
    );
    dir
}

struct Outcome {
    summary: RunSummary,
    exit_code: ExitCode,
    stdout: String,
    stderr: String,
}

async fn run(root: &Path, criteria: &[SelectionCriterion], overrides: ConfigOverrides) -> Outcome {
    let session = Session::new(root.to_path_buf(), None, overrides);
    let project = session.load().unwrap();
    let mut out = Vec::new();
    let mut err = Vec::new();
    let summary = session
        .run(&project, criteria, Arc::new(PassingExecutor), &mut out, &mut err)
        .await
        .unwrap();
    Outcome {
        exit_code: summary.exit_code(project.config().pass_with_no_tests),
        summary,
        stdout: String::from_utf8(out).unwrap(),
        stderr: String::from_utf8(err).unwrap(),
    }
}

fn related(files: &[&str]) -> SelectionCriterion {
    SelectionCriterion::RelatedToFiles(files.iter().map(|f| (*f).to_string()).collect())
}

fn pattern(p: &str) -> SelectionCriterion {
    SelectionCriterion::PathPattern(PathMatcher::compile(p).unwrap())
}

#[tokio::test]
async fn runs_tests_related_to_filename() {
    let dir = project();
    let outcome = run(dir.path(), &[related(&["a.js"])], ConfigOverrides::default()).await;

    assert!(outcome.stderr.contains("PASS __tests__/test.test.js"));
    assert!(outcome.stderr.contains("Ran all test suites related to files matching /a.js/i."));
    assert_eq!(outcome.exit_code, ExitCode::Success);
}

#[tokio::test]
async fn runs_tests_when_path_matches() {
    let dir = project();
    let outcome = run(dir.path(), &[pattern("__tests__")], ConfigOverrides::default()).await;

    assert!(outcome.stderr.contains("PASS __tests__/test.test.js"));
    assert!(outcome.stderr.contains("Ran all test suites matching /__tests__/i."));
}

#[tokio::test]
async fn no_match_when_related_file_is_missing() {
    let dir = project();
    let outcome = run(
        dir.path(),
        &[related(&["foo.js"]), pattern("__tests__")],
        ConfigOverrides::default(),
    )
    .await;

    assert!(outcome.stdout.contains("No tests found"));
    assert!(outcome.stdout.contains("Pattern: foo.js|__tests__ - 0 matches"));
    assert!(!outcome.stderr.contains("PASS"));
    assert_eq!(outcome.exit_code, ExitCode::TestsFailed);
}

#[tokio::test]
async fn related_tests_run_even_when_pattern_does_not_match() {
    let dir = project();
    let outcome = run(dir.path(), &[related(&["a.js"]), pattern("abcdd")], ConfigOverrides::default()).await;

    assert!(outcome.stderr.contains("PASS __tests__/test.test.js"));
    assert!(outcome
        .stderr
        .contains("Ran all test suites related to files matching /a.js|abcdd/i."));
}

#[tokio::test]
async fn intersection_mode_requires_both_criteria() {
    let dir = project();
    let overrides = ConfigOverrides {
        combine_mode: Some(zax_test_runner::CombineMode::Intersection),
        ..ConfigOverrides::default()
    };
    let outcome = run(dir.path(), &[related(&["a.js"]), pattern("abcdd")], overrides).await;

    assert!(outcome.stdout.contains("Pattern: a.js|abcdd - 0 matches"));
    assert!(outcome.summary.results.is_empty());
}

#[tokio::test]
async fn unmatched_pattern_reports_zero_matches() {
    let dir = project();
    let outcome = run(dir.path(), &[pattern("a.js")], ConfigOverrides::default()).await;

    assert_eq!(outcome.stdout, "No tests found\nPattern: a.js - 0 matches\n");
}

#[tokio::test]
async fn transitive_and_esm_imports_are_followed() {
    let dir = project();
    write_files(
        dir.path(),
        &[
            ("src/util.ts", "export const util = 1;\n"),
            ("src/index.ts", "export { util } from './util';\n"),
            ("src/index.spec.ts", "import { util } from './index';\n"),
            ("src/lazy.test.js", "test('lazy', async () => { await import('./util'); });\n"),
        ],
    );
    let outcome = run(dir.path(), &[related(&["src/util.ts"])], ConfigOverrides::default()).await;

    let mut ran: Vec<&str> = outcome.stderr.lines().filter(|l| l.starts_with("PASS ")).collect();
    ran.sort_unstable();
    assert_eq!(ran, vec!["PASS src/index.spec.ts", "PASS src/lazy.test.js"]);
    assert!(outcome.stderr.contains("Test Suites: 2 passed, 2 total"));
}

#[tokio::test]
async fn pass_with_no_tests_turns_empty_selection_into_success() {
    let dir = project();
    let overrides = ConfigOverrides { pass_with_no_tests: true, ..ConfigOverrides::default() };
    let outcome = run(dir.path(), &[related(&["nothing.js"])], overrides).await;

    assert!(outcome.stdout.contains("Pattern: nothing.js - 0 matches"));
    assert_eq!(outcome.exit_code, ExitCode::Success);
}

//! Test file classification and discovery.
//!
//! A snapshot of every test file in the project is taken once per run and
//! handed to selection explicitly.

use super::parser::is_parseable;
use crate::error::{Error, Result};
use crate::normalize::{normalize_slashes, relative_display};
use ignore::WalkBuilder;
use regex::Regex;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Filename infixes marking a test file.
const TEST_INFIXES: &[&str] = &[".test.", ".spec."];

/// Check if a path is a test file by convention.
///
/// `*.test.*` / `*.spec.*` JS/TS files, and any JS/TS file under `__tests__`.
pub fn is_test_file(path: &Path) -> bool {
    if !is_parseable(path) {
        return false;
    }

    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };

    if TEST_INFIXES.iter().any(|infix| name.contains(infix)) {
        return true;
    }

    path.components().any(|c| c.as_os_str() == "__tests__")
}

/// Decides which project files are test files.
#[derive(Debug, Clone, Default)]
pub struct TestClassifier {
    test_regex: Option<Regex>,
    ignore: Vec<Regex>,
}

impl TestClassifier {
    /// Build a classifier.
    ///
    /// `test_regex` replaces the naming convention and is matched against the
    /// project-relative path. `ignore_patterns` are matched against the
    /// absolute path; a match excludes the file.
    ///
    /// # Errors
    /// Returns `Error::InvalidPattern` for a regex that does not compile.
    pub fn new(test_regex: Option<&str>, ignore_patterns: &[String]) -> Result<Self> {
        let test_regex = test_regex.map(compile).transpose()?;
        let ignore = ignore_patterns
            .iter()
            .map(|p| compile(p))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { test_regex, ignore })
    }

    /// Whether `path` (absolute, under `root`) is a test file.
    pub fn is_test_file(&self, path: &Path, root: &Path) -> bool {
        let absolute = normalize_slashes(&path.to_string_lossy());
        if self.ignore.iter().any(|re| re.is_match(&absolute)) {
            return false;
        }

        match &self.test_regex {
            Some(re) => re.is_match(&relative_display(path, root)),
            None => is_test_file(path),
        }
    }
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|source| Error::InvalidPattern {
        pattern: pattern.to_string(),
        source,
    })
}

/// Walk every file under `root`, honouring `.gitignore` and skipping `node_modules`.
///
/// Paths are canonical and sorted.
pub fn walk_project_files(root: &Path) -> Vec<PathBuf> {
    let walker = WalkBuilder::new(root)
        .hidden(false)
        .git_ignore(true)
        .require_git(false)
        .filter_entry(|entry| entry.file_name() != "node_modules" && entry.file_name() != ".git")
        .build();

    let mut files: Vec<PathBuf> = walker
        .flatten()
        .filter(|entry| entry.file_type().is_some_and(|t| t.is_file()))
        .filter_map(|entry| entry.path().canonicalize().ok())
        .collect();
    files.sort();
    files.dedup();
    files
}

/// Read-only snapshot of every test file in the project.
#[derive(Debug, Clone, Default)]
pub struct TestDiscovery {
    root: PathBuf,
    tests: Vec<PathBuf>,
}

impl TestDiscovery {
    /// Classify already-walked files.
    pub fn from_files(root: &Path, files: &[PathBuf], classifier: &TestClassifier) -> Self {
        let tests: Vec<PathBuf> = files
            .iter()
            .filter(|p| classifier.is_test_file(p, root))
            .cloned()
            .collect();
        debug!("discovered {} test files out of {}", tests.len(), files.len());
        Self { root: root.to_path_buf(), tests }
    }

    /// Walk `root` and classify everything found.
    pub fn discover(root: &Path, classifier: &TestClassifier) -> Self {
        Self::from_files(root, &walk_project_files(root), classifier)
    }

    /// All test files, in discovery order.
    pub fn tests(&self) -> &[PathBuf] {
        &self.tests
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn len(&self) -> usize {
        self.tests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tests.is_empty()
    }

    /// Forward-slash path relative to the project root.
    pub fn relative(&self, path: &Path) -> String {
        relative_display(path, &self.root)
    }
}

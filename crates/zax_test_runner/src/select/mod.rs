//! Test selection.
//!
//! Turns the caller's criteria into one ordered set of test files plus the
//! description quoted by the run summary.
//!
//! When a path pattern and a related-files query arrive together, the default
//! `CombineMode::Alternation` keeps the related-files result as the selection
//! and only folds the pattern into the description (`a.js|abcdd`), matching
//! Jest's `--findRelatedTests` output. `CombineMode::Intersection` instead
//! narrows the related tests to those whose path also matches.

pub mod pattern;
pub mod related;
pub mod test_set;

pub use pattern::PathMatcher;
pub use related::{find_related_tests, RelatedTests};
pub use test_set::TestFileSet;

use crate::affected::{DepGraph, TestDiscovery};
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// One independent filter supplied by the caller.
#[derive(Debug, Clone)]
pub enum SelectionCriterion {
    PathPattern(PathMatcher),
    RelatedToFiles(Vec<String>),
    All,
}

/// How a path pattern and a related-files query are combined.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CombineMode {
    /// Related tests are selected; the pattern only joins the description.
    #[default]
    Alternation,
    /// Related tests whose path also matches the pattern.
    Intersection,
}

impl FromStr for CombineMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "alternation" => Ok(Self::Alternation),
            "intersection" => Ok(Self::Intersection),
            other => Err(format!("unknown combine mode '{other}' (expected alternation or intersection)")),
        }
    }
}

impl fmt::Display for CombineMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Alternation => f.write_str("alternation"),
            Self::Intersection => f.write_str("intersection"),
        }
    }
}

/// The effective criteria behind a selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Criteria {
    All,
    Pattern(String),
    Related(String),
    Combined { related: String, pattern: String, mode: CombineMode },
}

impl Criteria {
    /// The description string: `Pattern: <description> - 0 matches`.
    pub fn description(&self) -> String {
        match self {
            Criteria::All => String::new(),
            Criteria::Pattern(p) => p.clone(),
            Criteria::Related(r) => r.clone(),
            Criteria::Combined { related, pattern, .. } => format!("{related}|{pattern}"),
        }
    }

    /// Text following `Ran all test suites`, including the leading space.
    pub fn summary_qualifier(&self) -> String {
        match self {
            Criteria::All => String::new(),
            Criteria::Pattern(p) => format!(" matching /{p}/i"),
            Criteria::Related(_) | Criteria::Combined { mode: CombineMode::Alternation, .. } => {
                format!(" related to files matching /{}/i", self.description())
            }
            Criteria::Combined { related, pattern, mode: CombineMode::Intersection } => {
                format!(" related to files matching /{related}/i and matching /{pattern}/i")
            }
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, Criteria::All)
    }
}

/// A computed selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub tests: TestFileSet,
    pub criteria: Criteria,
}

impl Selection {
    pub fn description(&self) -> String {
        self.criteria.description()
    }
}

/// Applies criteria against one project snapshot.
pub struct Selector<'a> {
    graph: &'a DepGraph,
    discovery: &'a TestDiscovery,
    mode: CombineMode,
}

impl<'a> Selector<'a> {
    pub fn new(graph: &'a DepGraph, discovery: &'a TestDiscovery, mode: CombineMode) -> Self {
        Self { graph, discovery, mode }
    }

    /// Select test files for `criteria`.
    ///
    /// Several path patterns match if any does. Several related-files lists
    /// are concatenated. `All` only applies when nothing else is given.
    pub fn select(&self, criteria: &[SelectionCriterion]) -> Selection {
        let mut patterns: Vec<&PathMatcher> = Vec::new();
        let mut related_files: Option<Vec<String>> = None;

        for criterion in criteria {
            match criterion {
                SelectionCriterion::PathPattern(m) if !m.is_any() => patterns.push(m),
                SelectionCriterion::RelatedToFiles(files) => {
                    related_files.get_or_insert_with(Vec::new).extend(files.iter().cloned());
                }
                SelectionCriterion::PathPattern(_) | SelectionCriterion::All => {}
            }
        }

        let pattern_text = (!patterns.is_empty())
            .then(|| patterns.iter().map(|m| m.as_str()).collect::<Vec<_>>().join("|"));

        let selection = match (related_files, pattern_text) {
            (None, None) => Selection {
                tests: self.discovery.tests().iter().cloned().collect(),
                criteria: Criteria::All,
            },
            (None, Some(pattern)) => Selection {
                tests: self.matching(&patterns),
                criteria: Criteria::Pattern(pattern),
            },
            (Some(files), None) => {
                let related = find_related_tests(&files, self.graph, self.discovery);
                Selection { tests: related.tests, criteria: Criteria::Related(related.fragment) }
            }
            (Some(files), Some(pattern)) => self.combine(&files, &patterns, pattern),
        };

        debug!(
            "selected {} of {} tests for '{}'",
            selection.tests.len(),
            self.discovery.len(),
            selection.description()
        );
        selection
    }

    fn matching(&self, patterns: &[&PathMatcher]) -> TestFileSet {
        self.discovery
            .tests()
            .iter()
            .filter(|p| {
                let rel = self.discovery.relative(p);
                patterns.iter().any(|m| m.matches(&rel))
            })
            .cloned()
            .collect()
    }

    fn combine(&self, files: &[String], patterns: &[&PathMatcher], pattern: String) -> Selection {
        let related = find_related_tests(files, self.graph, self.discovery);
        let mut tests = related.tests;

        if self.mode == CombineMode::Intersection {
            tests.retain(|p| {
                let rel = self.discovery.relative(p);
                patterns.iter().any(|m| m.matches(&rel))
            });
        }

        Selection {
            tests,
            criteria: Criteria::Combined { related: related.fragment, pattern, mode: self.mode },
        }
    }
}

//! CLI argument parsing with clap derive.

use crate::config::ConfigOverrides;
use crate::error::{Error, Result};
use crate::select::{CombineMode, PathMatcher, SelectionCriterion};
use clap::Parser;
use std::num::NonZeroUsize;
use std::path::PathBuf;

/// Select and run the JavaScript/TypeScript test files affected by a change
#[derive(Debug, Parser)]
#[command(name = "zax_test_runner")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path patterns, or source files with --find-related-tests
    #[arg(value_name = "ARGS")]
    pub args: Vec<String>,

    /// Only run test files whose path matches this regex (repeatable)
    #[arg(long = "test-path-pattern", value_name = "REGEX")]
    pub test_path_pattern: Vec<String>,

    /// Treat ARGS as source files and run the tests that depend on them
    #[arg(long)]
    pub find_related_tests: bool,

    /// Project root (default: current directory)
    #[arg(long, value_name = "DIR", env = "ZAX_ROOT")]
    pub root: Option<PathBuf>,

    /// Use a standalone JSON config file instead of package.json
    #[arg(short = 'C', long = "config", value_name = "FILE", env = "ZAX_CONFIG")]
    pub config: Option<PathBuf>,

    /// Maximum test files running at once
    #[arg(long, value_name = "N")]
    pub max_workers: Option<NonZeroUsize>,

    /// Exit successfully when nothing is selected
    #[arg(long)]
    pub pass_with_no_tests: bool,

    /// How a path pattern combines with --find-related-tests
    #[arg(long, value_name = "MODE")]
    pub combine: Option<CombineMode>,

    /// Print the selected test files and exit
    #[arg(long, conflicts_with = "watch")]
    pub list_tests: bool,

    /// Rerun related tests when files change
    #[arg(long)]
    pub watch: bool,
}

impl Cli {
    /// Selection criteria in argument order: positional args first, then
    /// `--test-path-pattern` values.
    ///
    /// # Errors
    /// Returns `Error::InvalidPattern` for a pattern that does not compile and
    /// `Error::Config` for `--find-related-tests` without files.
    pub fn criteria(&self) -> Result<Vec<SelectionCriterion>> {
        let mut criteria = Vec::new();

        if self.find_related_tests {
            if self.args.is_empty() {
                return Err(Error::config("--find-related-tests needs at least one file", None));
            }
            criteria.push(SelectionCriterion::RelatedToFiles(self.args.clone()));
        } else {
            for arg in &self.args {
                criteria.push(SelectionCriterion::PathPattern(PathMatcher::compile(arg)?));
            }
        }

        for pattern in &self.test_path_pattern {
            criteria.push(SelectionCriterion::PathPattern(PathMatcher::compile(pattern)?));
        }

        if criteria.is_empty() {
            criteria.push(SelectionCriterion::All);
        }
        Ok(criteria)
    }

    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            max_workers: self.max_workers.map(NonZeroUsize::get),
            pass_with_no_tests: self.pass_with_no_tests,
            combine_mode: self.combine,
        }
    }

    pub fn root(&self) -> PathBuf {
        self.root.clone().unwrap_or_else(|| PathBuf::from("."))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("zax_test_runner").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn no_arguments_selects_all() {
        let criteria = parse(&[]).criteria().unwrap();
        assert!(matches!(criteria.as_slice(), [SelectionCriterion::All]));
    }

    #[test]
    fn positional_args_are_patterns() {
        let criteria = parse(&["foo", "bar"]).criteria().unwrap();
        assert_eq!(criteria.len(), 2);
        assert!(matches!(&criteria[0], SelectionCriterion::PathPattern(m) if m.as_str() == "foo"));
    }

    #[test]
    fn related_files_come_before_patterns() {
        let cli = parse(&["--find-related-tests", "a.js", "--test-path-pattern", "abcdd"]);
        let criteria = cli.criteria().unwrap();
        assert!(matches!(&criteria[0], SelectionCriterion::RelatedToFiles(f) if f == &vec!["a.js".to_string()]));
        assert!(matches!(&criteria[1], SelectionCriterion::PathPattern(m) if m.as_str() == "abcdd"));
    }

    #[test]
    fn related_without_files_is_an_error() {
        let err = parse(&["--find-related-tests"]).criteria().unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[test]
    fn invalid_pattern_is_reported() {
        let err = parse(&["--test-path-pattern", "foo("]).criteria().unwrap_err();
        assert!(matches!(err, Error::InvalidPattern { .. }));
    }

    #[test]
    fn overrides_from_flags() {
        let cli = parse(&["--max-workers", "2", "--pass-with-no-tests", "--combine", "intersection"]);
        let overrides = cli.overrides();
        assert_eq!(overrides.max_workers, Some(2));
        assert!(overrides.pass_with_no_tests);
        assert_eq!(overrides.combine_mode, Some(CombineMode::Intersection));
    }

    #[test]
    fn zero_workers_rejected_by_parser() {
        assert!(Cli::try_parse_from(["zax_test_runner", "--max-workers", "0"]).is_err());
    }

    #[test]
    fn list_and_watch_conflict() {
        assert!(Cli::try_parse_from(["zax_test_runner", "--list-tests", "--watch"]).is_err());
    }
}

//! Case-insensitive path pattern matching.

use crate::error::{Error, Result};
use regex::{Regex, RegexBuilder};

/// A compiled test path pattern.
///
/// Matches anywhere in the project-relative, forward-slash path. An empty
/// pattern matches everything.
#[derive(Debug, Clone)]
pub struct PathMatcher {
    source: String,
    regex: Option<Regex>,
}

impl PathMatcher {
    /// Compile `pattern` case-insensitively.
    ///
    /// # Errors
    /// Returns `Error::InvalidPattern` if `pattern` is not a valid regex.
    pub fn compile(pattern: &str) -> Result<Self> {
        if pattern.is_empty() {
            return Ok(Self::any());
        }

        let regex = RegexBuilder::new(pattern)
            .case_insensitive(true)
            .build()
            .map_err(|source| Error::InvalidPattern {
                pattern: pattern.to_string(),
                source,
            })?;

        Ok(Self { source: pattern.to_string(), regex: Some(regex) })
    }

    /// The identity matcher.
    pub fn any() -> Self {
        Self { source: String::new(), regex: None }
    }

    pub fn matches(&self, relative_path: &str) -> bool {
        self.regex.as_ref().is_none_or(|re| re.is_match(relative_path))
    }

    /// The pattern as the caller wrote it.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn is_any(&self) -> bool {
        self.regex.is_none()
    }
}

//! Path normalization utilities for cross-platform consistency.
//!
//! Pattern matching and report lines always see forward-slash paths relative
//! to the project root, whatever the host separator is.

use std::path::Path;

/// Maximum path length for logging.
const MAX_PATH_LOG_LENGTH: usize = 256;

/// Normalizes a path to use forward slashes only.
///
/// - Converts backslashes to forward slashes
/// - Collapses consecutive slashes
pub fn normalize_slashes(path: &str) -> String {
    let mut result = String::with_capacity(path.len());
    let mut last_was_slash = false;

    for c in path.chars() {
        let is_slash = c == '/' || c == '\\';
        if is_slash {
            if !last_was_slash {
                result.push('/');
            }
            last_was_slash = true;
        } else {
            result.push(c);
            last_was_slash = false;
        }
    }
    result
}

/// Project-relative, forward-slash form of `path`.
///
/// Paths outside `root` are returned whole (still slash-normalized).
pub fn relative_display(path: &Path, root: &Path) -> String {
    let shown = path.strip_prefix(root).unwrap_or(path);
    normalize_slashes(&shown.to_string_lossy())
}

/// Shortens a path for log output, keeping its tail.
pub fn truncate_for_log(path: &Path) -> String {
    let s = path.display().to_string();
    if s.len() <= MAX_PATH_LOG_LENGTH {
        return s;
    }
    let mut start = s.len() - MAX_PATH_LOG_LENGTH + 3;
    while !s.is_char_boundary(start) {
        start += 1;
    }
    format!("...{}", &s[start..])
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn normalize_converts_backslashes() {
        assert_eq!(normalize_slashes("foo\\bar\\baz"), "foo/bar/baz");
    }

    #[test]
    fn normalize_collapses_consecutive_slashes() {
        assert_eq!(normalize_slashes("foo//bar///baz"), "foo/bar/baz");
    }

    #[test]
    fn normalize_handles_mixed_separators() {
        assert_eq!(normalize_slashes("foo\\\\bar//baz"), "foo/bar/baz");
    }

    #[test]
    fn normalize_handles_empty_string() {
        assert_eq!(normalize_slashes(""), "");
    }

    #[test]
    fn relative_display_strips_root() {
        let root = PathBuf::from("/work");
        let path = PathBuf::from("/work/__tests__/a.test.js");
        assert_eq!(relative_display(&path, &root), "__tests__/a.test.js");
    }

    #[test]
    fn relative_display_keeps_outside_paths() {
        let root = PathBuf::from("/work");
        let path = PathBuf::from("/elsewhere/a.js");
        assert_eq!(relative_display(&path, &root), "/elsewhere/a.js");
    }

    #[test]
    fn truncate_short_path_unchanged() {
        assert_eq!(truncate_for_log(Path::new("/short.ts")), "/short.ts");
    }

    #[test]
    fn truncate_long_path_keeps_tail() {
        let long = format!("/{}/tail.ts", "a".repeat(300));
        let result = truncate_for_log(Path::new(&long));
        assert!(result.starts_with("..."));
        assert!(result.ends_with("tail.ts"));
        assert!(result.len() <= MAX_PATH_LOG_LENGTH);
    }
}

//! Insertion-ordered, de-duplicated set of test file paths.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TestFileSet {
    order: Vec<PathBuf>,
    seen: HashSet<PathBuf>,
}

impl TestFileSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `path` unless already present. Returns whether it was added.
    pub fn insert(&mut self, path: PathBuf) -> bool {
        if !self.seen.insert(path.clone()) {
            return false;
        }
        self.order.push(path);
        true
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PathBuf> {
        self.order.iter()
    }

    /// Keep only the paths satisfying `keep`, preserving order.
    pub fn retain(&mut self, mut keep: impl FnMut(&Path) -> bool) {
        let seen = &mut self.seen;
        self.order.retain(|p| {
            let kept = keep(p);
            if !kept {
                seen.remove(p);
            }
            kept
        });
    }
}

impl FromIterator<PathBuf> for TestFileSet {
    fn from_iter<I: IntoIterator<Item = PathBuf>>(iter: I) -> Self {
        let mut set = Self::new();
        for path in iter {
            set.insert(path);
        }
        set
    }
}

impl<'a> IntoIterator for &'a TestFileSet {
    type Item = &'a PathBuf;
    type IntoIter = std::slice::Iter<'a, PathBuf>;

    fn into_iter(self) -> Self::IntoIter {
        self.order.iter()
    }
}

impl IntoIterator for TestFileSet {
    type Item = PathBuf;
    type IntoIter = std::vec::IntoIter<PathBuf>;

    fn into_iter(self) -> Self::IntoIter {
        self.order.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_first_insertion_order_without_duplicates() {
        let set: TestFileSet = ["/b", "/a", "/b", "/c"].iter().map(PathBuf::from).collect();
        let paths: Vec<&PathBuf> = set.iter().collect();
        assert_eq!(paths, vec![Path::new("/b"), Path::new("/a"), Path::new("/c")]);
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn insert_reports_novelty() {
        let mut set = TestFileSet::new();
        assert!(set.insert(PathBuf::from("/a")));
        assert!(!set.insert(PathBuf::from("/a")));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn retain_updates_membership() {
        let mut set: TestFileSet = ["/a", "/b", "/c"].iter().map(PathBuf::from).collect();
        set.retain(|p| p != Path::new("/b"));
        assert_eq!(set.len(), 2);
        assert!(set.insert(PathBuf::from("/b")));
        assert_eq!(set.iter().last(), Some(&PathBuf::from("/b")));
    }

    #[test]
    fn empty_set_is_empty() {
        assert!(TestFileSet::new().is_empty());
    }
}

//! File to pattern mapping and path resolution.
//!
//! [`resolve`] walks a [`PatternSet`] in insertion order and checks that each
//! file exists. It is lazy: pairs are produced one at a time, and the first
//! missing file ends the sequence with [`RewriteError::MissingFile`].

use crate::pattern::Pattern;
use crate::rewrite::RewriteError;
use indexmap::IndexMap;
use std::env;
use std::path::{Path, PathBuf};

/// Ordered mapping from file path to the patterns to apply to it.
#[derive(Debug, Default)]
pub struct PatternSet {
    entries: IndexMap<String, Vec<Box<dyn Pattern>>>,
}

impl PatternSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add patterns for `path`.
    ///
    /// A path that is already present keeps its position; the new patterns
    /// are appended after the existing ones.
    pub fn insert(&mut self, path: impl Into<String>, patterns: Vec<Box<dyn Pattern>>) {
        self.entries.entry(path.into()).or_default().extend(patterns);
    }

    /// Add a single pattern for `path`.
    pub fn push(&mut self, path: impl Into<String>, pattern: impl Pattern + 'static) {
        self.insert(path, vec![Box::new(pattern)]);
    }

    pub fn get(&self, path: &str) -> Option<&[Box<dyn Pattern>]> {
        self.entries.get(path).map(Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Box<dyn Pattern>])> {
        self.entries
            .iter()
            .map(|(path, patterns)| (path.as_str(), patterns.as_slice()))
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(String, Vec<Box<dyn Pattern>>)> for PatternSet {
    fn from_iter<I: IntoIterator<Item = (String, Vec<Box<dyn Pattern>>)>>(iter: I) -> Self {
        let mut set = PatternSet::new();
        for (path, patterns) in iter {
            set.insert(path, patterns);
        }
        set
    }
}

/// A file that exists, with the patterns that target it.
#[derive(Debug, Clone, Copy)]
pub struct ResolvedTarget<'a> {
    pub path: &'a Path,
    pub patterns: &'a [Box<dyn Pattern>],
}

/// Lazy resolution of a [`PatternSet`]. See [`resolve`].
#[derive(Debug)]
#[must_use = "iterators are lazy and do nothing unless consumed"]
pub struct PathPatterns<'a> {
    inner: indexmap::map::Iter<'a, String, Vec<Box<dyn Pattern>>>,
    failed: bool,
}

impl<'a> Iterator for PathPatterns<'a> {
    type Item = Result<ResolvedTarget<'a>, RewriteError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let (path_str, patterns) = self.inner.next()?;
        let path = Path::new(path_str.as_str());

        if path.exists() {
            return Some(Ok(ResolvedTarget {
                path,
                patterns: patterns.as_slice(),
            }));
        }

        self.failed = true;
        Some(Err(RewriteError::MissingFile {
            path: path_str.clone(),
            full_path: absolute_path(path),
        }))
    }
}

impl std::iter::FusedIterator for PathPatterns<'_> {}

/// Resolve every path in `set`, in insertion order.
pub fn resolve(set: &PatternSet) -> PathPatterns<'_> {
    PathPatterns {
        inner: set.entries.iter(),
        failed: false,
    }
}

/// Best effort absolute form of a path that may not exist.
///
/// Resolves symlinks in the parent directory when it exists, otherwise joins
/// the path onto the current directory.
fn absolute_path(path: &Path) -> PathBuf {
    if let (Some(parent), Some(name)) = (path.parent(), path.file_name()) {
        let parent = if parent.as_os_str().is_empty() {
            Path::new(".")
        } else {
            parent
        };
        if let Ok(parent) = parent.canonicalize() {
            return parent.join(name);
        }
    }
    if path.is_absolute() {
        return path.to_path_buf();
    }
    env::current_dir()
        .map(|cwd| cwd.join(path))
        .unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::LiteralPattern;
    use std::fs;

    #[test]
    fn test_pattern_set_preserves_order() {
        let mut set = PatternSet::new();
        set.push("z.txt", LiteralPattern::new("1", "2"));
        set.push("a.txt", LiteralPattern::new("1", "2"));
        set.push("z.txt", LiteralPattern::new("3", "4"));

        assert_eq!(set.paths().collect::<Vec<_>>(), vec!["z.txt", "a.txt"]);
        assert_eq!(set.get("z.txt").unwrap().len(), 2);
        assert_eq!(set.get("z.txt").unwrap()[1].raw(), "3");
    }

    #[test]
    fn test_resolve_existing_files() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.txt");
        let b = dir.path().join("b.txt");
        fs::write(&a, "1").unwrap();
        fs::write(&b, "1").unwrap();

        let mut set = PatternSet::new();
        set.push(a.to_string_lossy(), LiteralPattern::new("1", "2"));
        set.push(b.to_string_lossy(), LiteralPattern::new("1", "2"));

        let targets: Vec<_> = resolve(&set).collect::<Result<_, _>>().unwrap();
        assert_eq!(targets.len(), 2);
        assert_eq!(targets[0].path, a.as_path());
        assert_eq!(targets[1].path, b.as_path());
        assert_eq!(targets[0].patterns.len(), 1);
    }

    #[test]
    fn test_resolve_stops_after_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let present = dir.path().join("present.txt");
        let missing = dir.path().join("missing.txt");
        let after = dir.path().join("after.txt");
        fs::write(&present, "1").unwrap();
        fs::write(&after, "1").unwrap();

        let mut set = PatternSet::new();
        set.push(present.to_string_lossy(), LiteralPattern::new("1", "2"));
        set.push(missing.to_string_lossy(), LiteralPattern::new("1", "2"));
        set.push(after.to_string_lossy(), LiteralPattern::new("1", "2"));

        let mut iter = resolve(&set);
        assert!(iter.next().unwrap().is_ok());
        match iter.next() {
            Some(Err(RewriteError::MissingFile { path, full_path })) => {
                assert_eq!(path, missing.to_string_lossy());
                assert!(full_path.is_absolute());
                assert!(full_path.ends_with("missing.txt"));
            }
            other => panic!("expected MissingFile, got {other:?}"),
        }
        assert!(iter.next().is_none());
    }

    #[test]
    fn test_absolute_path_for_relative_missing_file() {
        let full = absolute_path(Path::new("does-not-exist-anywhere.cfg"));
        assert!(full.is_absolute());
        assert!(full.ends_with("does-not-exist-anywhere.cfg"));
    }
}

use super::Pattern;
use std::ops::Range;

/// Exact text search and replace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiteralPattern {
    search: String,
    replace: String,
}

impl LiteralPattern {
    pub fn new(search: impl Into<String>, replace: impl Into<String>) -> Self {
        Self {
            search: search.into(),
            replace: replace.into(),
        }
    }

    pub fn search(&self) -> &str {
        &self.search
    }
}

impl Pattern for LiteralPattern {
    fn raw(&self) -> &str {
        &self.search
    }

    fn find_in_line(&self, line: &str) -> Vec<Range<usize>> {
        if self.search.is_empty() {
            return Vec::new();
        }
        line.match_indices(self.search.as_str())
            .map(|(start, found)| start..start + found.len())
            .collect()
    }

    fn replacement(&self, _token: &str) -> String {
        self.replace.clone()
    }
}

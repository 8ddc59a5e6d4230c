use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RewriteError {
    #[error("File does not exist: '{path}' ({})", full_path.display())]
    MissingFile { path: String, full_path: PathBuf },

    #[error(transparent)]
    NoPatternMatch(#[from] NoPatternMatch),

    #[error("I/O error reading {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// One pattern that matched nothing in its target file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternFailure {
    /// File path as supplied in the pattern set.
    pub path: String,
    /// Pattern text as configured.
    pub pattern: String,
    /// What the pattern compiles to, when that helps debugging.
    pub explanation: Option<String>,
    /// Closest looking line (1-based line number, text), if any is close.
    pub closest_line: Option<(usize, String)>,
}

impl fmt::Display for PatternFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: no match for pattern '{}'", self.path, self.pattern)
    }
}

/// Every unmatched pattern of a rewrite batch, reported together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoPatternMatch {
    pub failures: Vec<PatternFailure>,
}

impl NoPatternMatch {
    pub fn len(&self) -> usize {
        self.failures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }

    /// Distinct file paths with at least one failure, in report order.
    pub fn files(&self) -> Vec<&str> {
        let mut files: Vec<&str> = Vec::new();
        for failure in &self.failures {
            if !files.contains(&failure.path.as_str()) {
                files.push(&failure.path);
            }
        }
        files
    }
}

impl fmt::Display for NoPatternMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid pattern(s): {} without a match", self.failures.len())?;
        for failure in &self.failures {
            write!(f, "\n  {failure}")?;
        }
        Ok(())
    }
}

impl std::error::Error for NoPatternMatch {}

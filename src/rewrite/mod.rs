//! Rewrite engine: file content in, before/after line records out.
//!
//! Content is split on a single detected line separator so that joining the
//! lines back with the same separator reproduces the file byte for byte.
//! Nothing in here writes to disk; see [`crate::persist`] for that.
//!
//! Pattern failures do not stop the run. Every pattern of every file is
//! tried, and all misses are returned together as one [`NoPatternMatch`] so
//! that a broken configuration can be fixed in a single pass.

pub mod errors;

pub use errors::{NoPatternMatch, PatternFailure, RewriteError};

use crate::pattern::Pattern;
use crate::resolve::{resolve, PatternSet, ResolvedTarget};
use std::fmt;
use std::fs;

/// Minimum similarity for a line to be offered as a "did you mean" hint.
const HINT_THRESHOLD: f64 = 0.6;

/// Line separator of a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LineSep {
    Lf,
    CrLf,
    Cr,
}

impl LineSep {
    pub fn as_str(self) -> &'static str {
        match self {
            LineSep::Lf => "\n",
            LineSep::CrLf => "\r\n",
            LineSep::Cr => "\r",
        }
    }
}

impl fmt::Display for LineSep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LineSep::Lf => "LF",
            LineSep::CrLf => "CRLF",
            LineSep::Cr => "CR",
        })
    }
}

/// Detect the line separator used by `content`.
///
/// `\r\n` wins over a lone `\r`, which wins over `\n`. Content without any
/// separator (including empty content) is treated as `\n`.
pub fn detect_line_sep(content: &str) -> LineSep {
    if content.contains("\r\n") {
        LineSep::CrLf
    } else if content.contains('\r') {
        LineSep::Cr
    } else {
        LineSep::Lf
    }
}

/// Split `content` on `sep`, dropping the separators.
///
/// A trailing separator produces a final empty line, so
/// `split_lines(c, s).join(s.as_str()) == c` always holds.
pub fn split_lines(content: &str, sep: LineSep) -> Vec<String> {
    content.split(sep.as_str()).map(str::to_string).collect()
}

/// Line-wise content of one file before and after rewriting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewrittenFileData {
    /// File path as supplied, not normalized.
    pub path: String,
    pub line_sep: LineSep,
    pub old_lines: Vec<String>,
    pub new_lines: Vec<String>,
}

impl RewrittenFileData {
    pub fn old_content(&self) -> String {
        self.old_lines.join(self.line_sep.as_str())
    }

    pub fn new_content(&self) -> String {
        self.new_lines.join(self.line_sep.as_str())
    }

    pub fn is_changed(&self) -> bool {
        self.old_lines != self.new_lines
    }
}

/// Apply `patterns` to `old_lines`.
///
/// Whether a pattern matched is decided against the original lines, so one
/// pattern's replacement can't hide or create a match for another. The
/// replacements themselves are applied in pattern order.
pub fn rewrite_lines(
    path: &str,
    patterns: &[Box<dyn Pattern>],
    old_lines: &[String],
) -> Result<Vec<String>, NoPatternMatch> {
    let mut new_lines = old_lines.to_vec();
    let mut failures = Vec::new();

    for pattern in patterns {
        if !pattern.is_match(old_lines) {
            failures.push(pattern_failure(path, pattern.as_ref(), old_lines));
            continue;
        }
        if let Some(lines) = pattern.rewrite(&new_lines) {
            new_lines = lines;
        }
    }

    if failures.is_empty() {
        Ok(new_lines)
    } else {
        Err(NoPatternMatch { failures })
    }
}

fn pattern_failure(path: &str, pattern: &dyn Pattern, lines: &[String]) -> PatternFailure {
    let failure = PatternFailure {
        path: path.to_string(),
        pattern: pattern.raw().to_string(),
        explanation: pattern.explain(),
        closest_line: closest_line(pattern.raw(), lines),
    };

    tracing::error!(
        path = %failure.path,
        pattern = %failure.pattern,
        "no match for pattern"
    );
    if let Some(explanation) = &failure.explanation {
        tracing::error!(pattern = %failure.pattern, "{explanation}");
    }
    failure
}

/// Most similar non-blank line to `raw`, as (1-based line number, text).
fn closest_line(raw: &str, lines: &[String]) -> Option<(usize, String)> {
    lines
        .iter()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(idx, line)| {
            let score = strsim::normalized_levenshtein(raw.trim(), line.trim());
            (score, idx, line)
        })
        .filter(|(score, _, _)| *score >= HINT_THRESHOLD)
        .max_by(|a, b| a.0.total_cmp(&b.0).then(b.1.cmp(&a.1)))
        .map(|(_, idx, line)| (idx + 1, line.clone()))
}

/// Build a rewrite record from in-memory content.
pub fn rfd_from_content(
    path: &str,
    patterns: &[Box<dyn Pattern>],
    content: &str,
) -> Result<RewrittenFileData, NoPatternMatch> {
    let line_sep = detect_line_sep(content);
    let old_lines = split_lines(content, line_sep);
    let new_lines = rewrite_lines(path, patterns, &old_lines)?;

    Ok(RewrittenFileData {
        path: path.to_string(),
        line_sep,
        old_lines,
        new_lines,
    })
}

fn read_target(target: &ResolvedTarget<'_>) -> Result<String, RewriteError> {
    let content = fs::read_to_string(target.path).map_err(|source| RewriteError::Io {
        path: target.path.to_path_buf(),
        source,
    })?;
    tracing::debug!(
        path = %target.path.display(),
        bytes = content.len(),
        patterns = target.patterns.len(),
        "read rewrite target"
    );
    Ok(content)
}

/// Read one resolved file and rewrite it.
pub fn build_rewrite(target: &ResolvedTarget<'_>) -> Result<RewrittenFileData, RewriteError> {
    let content = read_target(target)?;
    let path = target.path.to_string_lossy();
    Ok(rfd_from_content(&path, target.patterns, &content)?)
}

/// Rewrite every target, collecting pattern failures across all of them.
///
/// Returns records only if every pattern of every file matched. I/O errors
/// abort immediately.
pub fn rewrite_targets<'a, I>(targets: I) -> Result<Vec<RewrittenFileData>, RewriteError>
where
    I: IntoIterator<Item = ResolvedTarget<'a>>,
{
    let mut records = Vec::new();
    let mut failures = Vec::new();

    for target in targets {
        match build_rewrite(&target) {
            Ok(rfd) => records.push(rfd),
            Err(RewriteError::NoPatternMatch(err)) => failures.extend(err.failures),
            Err(err) => return Err(err),
        }
    }

    if !failures.is_empty() {
        return Err(NoPatternMatch { failures }.into());
    }
    Ok(records)
}

/// Resolve and rewrite a whole pattern set.
///
/// Resolution completes before any file is read, so a missing file fails
/// the batch without touching the others.
pub fn rewrite_all(set: &PatternSet) -> Result<Vec<RewrittenFileData>, RewriteError> {
    let targets = resolve(set).collect::<Result<Vec<_>, _>>()?;
    rewrite_targets(targets)
}

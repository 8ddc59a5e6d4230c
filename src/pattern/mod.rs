//! Version token matchers.
//!
//! A [`Pattern`] finds version tokens inside individual lines and computes
//! what to put in their place. The rewrite engine only talks to this trait;
//! the concrete syntaxes live in the submodules.

pub mod literal;
pub mod regexp;
pub mod template;

pub use literal::LiteralPattern;
pub use regexp::RegexPattern;
pub use template::TemplatePattern;

use std::fmt;
use std::ops::Range;
use thiserror::Error;

/// Problems building a pattern from its configured text.
#[derive(Error, Debug, Clone)]
pub enum PatternError {
    #[error("invalid regex for pattern '{pattern}': {source}")]
    InvalidRegex {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("pattern '{0}' has no {{version}} placeholder")]
    MissingPlaceholder(String),

    #[error("pattern is empty")]
    Empty,
}

/// Locate-and-replace capability for one configured pattern.
pub trait Pattern: fmt::Debug {
    /// Pattern text as it was written in configuration.
    fn raw(&self) -> &str;

    /// Byte spans of version tokens in `line`, ascending and non-overlapping.
    fn find_in_line(&self, line: &str) -> Vec<Range<usize>>;

    /// Text that replaces a matched token.
    fn replacement(&self, token: &str) -> String;

    /// Extra diagnostic shown when the pattern matches nothing.
    fn explain(&self) -> Option<String> {
        None
    }

    /// True if any line contains at least one token.
    fn is_match(&self, lines: &[String]) -> bool {
        lines.iter().any(|line| !self.find_in_line(line).is_empty())
    }

    /// Rewrite every token in `lines`.
    ///
    /// Returns `None` when nothing matched. Implementations may return a
    /// different number of lines than they were given.
    fn rewrite(&self, lines: &[String]) -> Option<Vec<String>> {
        let mut matched = false;
        let rewritten: Vec<String> = lines
            .iter()
            .map(|line| {
                let spans = self.find_in_line(line);
                if spans.is_empty() {
                    return line.clone();
                }
                matched = true;
                splice_line(line, &spans, |token| self.replacement(token))
            })
            .collect();

        matched.then_some(rewritten)
    }
}

/// Replace each span of `line` with the output of `replace`.
///
/// Spans must be ascending and non-overlapping.
pub(crate) fn splice_line<F>(line: &str, spans: &[Range<usize>], mut replace: F) -> String
where
    F: FnMut(&str) -> String,
{
    let mut out = String::with_capacity(line.len());
    let mut cursor = 0;
    for span in spans {
        out.push_str(&line[cursor..span.start]);
        out.push_str(&replace(&line[span.clone()]));
        cursor = span.end;
    }
    out.push_str(&line[cursor..]);
    out
}

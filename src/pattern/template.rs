//! `{version}` placeholder patterns.
//!
//! The text around the placeholder is matched literally, the placeholder
//! itself matches a dotted version number with an optional pre-release or
//! build suffix:
//!
//! ```
//! use verbump::pattern::{Pattern, TemplatePattern};
//!
//! let pattern = TemplatePattern::new(r#"version = "{version}""#, "2.0.0").unwrap();
//! let lines = vec![r#"version = "1.9.3""#.to_string()];
//! assert_eq!(pattern.rewrite(&lines).unwrap(), vec![r#"version = "2.0.0""#]);
//! ```

use super::{Pattern, PatternError};
use crate::cache::get_or_compile_regex;
use regex::Regex;
use std::ops::Range;

pub const PLACEHOLDER: &str = "{version}";

const VERSION_TOKEN: &str = r"\d+(?:\.\d+)*(?:[-+][0-9A-Za-z.+\-]*)?";

#[derive(Debug, Clone)]
pub struct TemplatePattern {
    raw: String,
    regex: Regex,
    new_version: String,
}

impl TemplatePattern {
    pub fn new(raw: impl Into<String>, new_version: impl Into<String>) -> Result<Self, PatternError> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            return Err(PatternError::Empty);
        }
        if !raw.contains(PLACEHOLDER) {
            return Err(PatternError::MissingPlaceholder(raw));
        }

        let source = template_to_regex(&raw);
        let regex = get_or_compile_regex(&source).map_err(|source| PatternError::InvalidRegex {
            pattern: raw.clone(),
            source,
        })?;

        Ok(Self {
            raw,
            regex,
            new_version: new_version.into(),
        })
    }
}

/// Escape the literal parts of a template and turn each placeholder into a
/// capture group.
fn template_to_regex(raw: &str) -> String {
    raw.split(PLACEHOLDER)
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(&format!("({VERSION_TOKEN})"))
}

impl Pattern for TemplatePattern {
    fn raw(&self) -> &str {
        &self.raw
    }

    fn find_in_line(&self, line: &str) -> Vec<Range<usize>> {
        self.regex
            .captures_iter(line)
            .flat_map(|caps| {
                caps.iter()
                    .skip(1)
                    .flatten()
                    .map(|m| m.range())
                    .collect::<Vec<_>>()
            })
            .collect()
    }

    fn replacement(&self, _token: &str) -> String {
        self.new_version.clone()
    }

    fn explain(&self) -> Option<String> {
        Some(format!("compiles to regex: {}", self.regex.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_requires_placeholder() {
        let err = TemplatePattern::new("version = ", "1.0.0").unwrap_err();
        assert!(matches!(err, PatternError::MissingPlaceholder(_)));
    }

    #[test]
    fn test_template_rejects_empty() {
        let err = TemplatePattern::new("  ", "1.0.0").unwrap_err();
        assert!(matches!(err, PatternError::Empty));
    }

    #[test]
    fn test_template_escapes_literal_text() {
        let pattern = TemplatePattern::new("__version__ = ({version})", "3.0.0").unwrap();
        let spans = pattern.find_in_line("__version__ = (2.1.0)");
        assert_eq!(spans, vec![15..20]);
        assert!(pattern.find_in_line("__version__ = 2.1.0").is_empty());
    }

    #[test]
    fn test_template_prerelease_token() {
        let pattern = TemplatePattern::new("v{version}", "1.0.0").unwrap();
        let lines = vec!["release v1.0.0-beta.2 notes".to_string()];
        assert_eq!(
            pattern.rewrite(&lines).unwrap(),
            vec!["release v1.0.0 notes"]
        );
    }

    #[test]
    fn test_template_multiple_placeholders() {
        let pattern = TemplatePattern::new("{version}..{version}", "2.0").unwrap();
        let lines = vec!["range 1.0..1.5".to_string()];
        assert_eq!(pattern.rewrite(&lines).unwrap(), vec!["range 2.0..2.0"]);
    }

    #[test]
    fn test_template_explain_mentions_regex() {
        let pattern = TemplatePattern::new("v{version}", "1.0.0").unwrap();
        assert!(pattern.explain().unwrap().contains("compiles to regex"));
    }
}

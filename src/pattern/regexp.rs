use super::{Pattern, PatternError};
use crate::cache::get_or_compile_regex;
use regex::Regex;
use std::ops::Range;

/// Name of the capture group holding the version token.
pub const VERSION_GROUP: &str = "version";

/// Raw regular expression pattern.
///
/// The `version` named group marks the token to replace. Without that group
/// the whole match is replaced.
#[derive(Debug, Clone)]
pub struct RegexPattern {
    regex: Regex,
    new_version: String,
}

impl RegexPattern {
    pub fn new(source: &str, new_version: impl Into<String>) -> Result<Self, PatternError> {
        if source.trim().is_empty() {
            return Err(PatternError::Empty);
        }
        let regex = get_or_compile_regex(source).map_err(|err| PatternError::InvalidRegex {
            pattern: source.to_string(),
            source: err,
        })?;

        Ok(Self {
            regex,
            new_version: new_version.into(),
        })
    }

    fn has_version_group(&self) -> bool {
        self.regex
            .capture_names()
            .any(|name| name == Some(VERSION_GROUP))
    }
}

impl Pattern for RegexPattern {
    fn raw(&self) -> &str {
        self.regex.as_str()
    }

    fn find_in_line(&self, line: &str) -> Vec<Range<usize>> {
        if !self.has_version_group() {
            return self.regex.find_iter(line).map(|m| m.range()).collect();
        }
        self.regex
            .captures_iter(line)
            .filter_map(|caps| caps.name(VERSION_GROUP).map(|m| m.range()))
            .collect()
    }

    fn replacement(&self, _token: &str) -> String {
        self.new_version.clone()
    }
}

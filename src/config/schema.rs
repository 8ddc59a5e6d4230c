use crate::config::version::parse_version;
use crate::pattern::template::PLACEHOLDER;
use crate::pattern::{LiteralPattern, Pattern, PatternError, RegexPattern, TemplatePattern};
use crate::resolve::PatternSet;
use indexmap::IndexMap;
use serde::Deserialize;
use std::fmt;
use std::path::{Component, Path, PathBuf};

#[derive(Debug, Deserialize, Default, Clone)]
pub struct BumpConfig {
    #[serde(default)]
    pub meta: Metadata,
    #[serde(default)]
    pub file_patterns: IndexMap<String, Vec<PatternSpec>>,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct Metadata {
    #[serde(default)]
    pub current_version: String,
    /// Interpret `file_patterns` keys relative to the config file.
    #[serde(default)]
    pub workspace_relative: bool,
}

/// One pattern as written in the config file.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(untagged)]
pub enum PatternSpec {
    /// `'version = "{version}"'`
    Template(String),
    /// `{ regex = '...(?P<version>...)...' }`
    Regex { regex: String },
    /// `{ search = "1.0.0", replace = "1.1.0" }`
    Literal { search: String, replace: String },
}

impl PatternSpec {
    pub fn raw(&self) -> &str {
        match self {
            PatternSpec::Template(raw) => raw,
            PatternSpec::Regex { regex } => regex,
            PatternSpec::Literal { search, .. } => search,
        }
    }

    pub fn compile(&self, new_version: &str) -> Result<Box<dyn Pattern>, PatternError> {
        let pattern: Box<dyn Pattern> = match self {
            PatternSpec::Template(raw) => {
                Box::new(TemplatePattern::new(raw.as_str(), new_version)?)
            }
            PatternSpec::Regex { regex } => Box::new(RegexPattern::new(regex, new_version)?),
            PatternSpec::Literal { search, replace } => {
                if search.is_empty() {
                    return Err(PatternError::Empty);
                }
                Box::new(LiteralPattern::new(search.as_str(), replace.as_str()))
            }
        };
        Ok(pattern)
    }
}

impl BumpConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut issues = Vec::new();

        if self.meta.current_version.trim().is_empty() {
            issues.push(ValidationIssue::MissingField {
                file: None,
                field: "meta.current_version",
            });
        } else if let Err(err) = parse_version(&self.meta.current_version) {
            issues.push(ValidationIssue::InvalidVersion {
                message: err.to_string(),
            });
        }

        if self.file_patterns.is_empty() {
            issues.push(ValidationIssue::EmptyFilePatterns);
        }

        for (file, specs) in &self.file_patterns {
            if file.trim().is_empty() {
                issues.push(ValidationIssue::MissingField {
                    file: None,
                    field: "file_patterns key",
                });
            }
            if specs.is_empty() {
                issues.push(ValidationIssue::NoPatterns { file: file.clone() });
            }

            for spec in specs {
                match spec {
                    PatternSpec::Template(raw) => {
                        if raw.trim().is_empty() {
                            issues.push(ValidationIssue::MissingField {
                                file: Some(file.clone()),
                                field: "pattern",
                            });
                        } else if !raw.contains(PLACEHOLDER) {
                            issues.push(ValidationIssue::MissingPlaceholder {
                                file: file.clone(),
                                pattern: raw.clone(),
                            });
                        }
                    }
                    PatternSpec::Regex { regex } => {
                        if regex.trim().is_empty() {
                            issues.push(ValidationIssue::MissingField {
                                file: Some(file.clone()),
                                field: "regex",
                            });
                        }
                    }
                    PatternSpec::Literal { search, .. } => {
                        if search.is_empty() {
                            issues.push(ValidationIssue::MissingField {
                                file: Some(file.clone()),
                                field: "search",
                            });
                        }
                    }
                }
            }
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { issues })
        }
    }

    /// Compile every pattern for a bump to `new_version`.
    ///
    /// With `workspace_relative`, keys are joined onto `base_dir`. Every
    /// pattern is compiled even after a failure so all errors are reported.
    pub fn pattern_set(
        &self,
        base_dir: &Path,
        new_version: &str,
    ) -> Result<PatternSet, PatternCompileError> {
        let mut set = PatternSet::new();
        let mut errors = Vec::new();

        for (file, specs) in &self.file_patterns {
            let target = if self.meta.workspace_relative {
                base_dir.join(file)
            } else {
                PathBuf::from(file)
            };
            // Spellings of the same file share one entry, patterns in order.
            let key = normalize_path(&target).to_string_lossy().into_owned();

            let mut patterns = Vec::with_capacity(specs.len());
            for spec in specs {
                match spec.compile(new_version) {
                    Ok(pattern) => patterns.push(pattern),
                    Err(source) => errors.push((file.clone(), source)),
                }
            }
            set.insert(key, patterns);
        }

        if errors.is_empty() {
            Ok(set)
        } else {
            Err(PatternCompileError { errors })
        }
    }
}

/// Patterns that failed to compile, with the file they belong to.
/// Lexically clean `path`: drop `.` segments and fold `name/..` pairs.
///
/// The filesystem is not consulted, so symlinks are left alone.
fn normalize_path(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
            other => out.push(other.as_os_str()),
        }
    }
    if out.as_os_str().is_empty() {
        out.push(".");
    }
    out
}

#[derive(Debug, Clone)]
pub struct PatternCompileError {
    pub errors: Vec<(String, PatternError)>,
}

impl fmt::Display for PatternCompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, (file, err)) in self.errors.iter().enumerate() {
            if idx > 0 {
                writeln!(f)?;
            }
            write!(f, "{file}: {err}")?;
        }
        Ok(())
    }
}

impl std::error::Error for PatternCompileError {}

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub issues: Vec<ValidationIssue>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, issue) in self.issues.iter().enumerate() {
            if idx > 0 {
                writeln!(f)?;
            }
            write!(f, "{issue}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationIssue {
    EmptyFilePatterns,
    MissingField {
        file: Option<String>,
        field: &'static str,
    },
    InvalidVersion {
        message: String,
    },
    NoPatterns {
        file: String,
    },
    MissingPlaceholder {
        file: String,
        pattern: String,
    },
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationIssue::EmptyFilePatterns => write!(f, "config contains no file_patterns"),
            ValidationIssue::MissingField { file, field } => match file {
                Some(file) => write!(f, "'{file}' has a pattern missing required field '{field}'"),
                None => write!(f, "missing required field '{field}'"),
            },
            ValidationIssue::InvalidVersion { message } => {
                write!(f, "invalid meta.current_version: {message}")
            }
            ValidationIssue::NoPatterns { file } => write!(f, "'{file}' has no patterns"),
            ValidationIssue::MissingPlaceholder { file, pattern } => write!(
                f,
                "'{file}' pattern '{pattern}' has no {PLACEHOLDER} placeholder"
            ),
        }
    }
}

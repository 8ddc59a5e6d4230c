use crate::config::schema::{BumpConfig, PatternCompileError, ValidationError};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// File name looked up by [`find_config`].
pub const CONFIG_FILE_NAME: &str = "verbump.toml";

#[derive(Debug)]
pub enum ConfigError {
    NotFound {
        start: PathBuf,
    },
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Toml {
        path: Option<PathBuf>,
        source: toml_edit::de::Error,
    },
    Validation {
        path: Option<PathBuf>,
        source: ValidationError,
    },
    Pattern {
        path: Option<PathBuf>,
        source: PatternCompileError,
    },
}

impl ConfigError {
    fn with_path(self, path: &Path) -> Self {
        let path = path.to_path_buf();
        match self {
            ConfigError::Toml { path: None, source } => ConfigError::Toml {
                path: Some(path),
                source,
            },
            ConfigError::Validation { path: None, source } => ConfigError::Validation {
                path: Some(path),
                source,
            },
            ConfigError::Pattern { path: None, source } => ConfigError::Pattern {
                path: Some(path),
                source,
            },
            other => other,
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::NotFound { start } => write!(
                f,
                "no {} found in {} or any parent directory",
                CONFIG_FILE_NAME,
                start.display()
            ),
            ConfigError::Io { path, source } => {
                write!(f, "failed to read config from {}: {}", path.display(), source)
            }
            ConfigError::Toml { path, source } => match path {
                Some(path) => write!(
                    f,
                    "failed to parse config TOML ({}): {}",
                    path.display(),
                    source
                ),
                None => write!(f, "failed to parse config TOML: {}", source),
            },
            ConfigError::Validation { path, source } => match path {
                Some(path) => write!(f, "invalid config ({}):\n{}", path.display(), source),
                None => write!(f, "invalid config:\n{}", source),
            },
            ConfigError::Pattern { path, source } => match path {
                Some(path) => write!(f, "invalid patterns ({}):\n{}", path.display(), source),
                None => write!(f, "invalid patterns:\n{}", source),
            },
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::NotFound { .. } => None,
            ConfigError::Io { source, .. } => Some(source),
            ConfigError::Toml { source, .. } => Some(source),
            ConfigError::Validation { source, .. } => Some(source),
            ConfigError::Pattern { source, .. } => Some(source),
        }
    }
}

impl From<PatternCompileError> for ConfigError {
    fn from(source: PatternCompileError) -> Self {
        ConfigError::Pattern { path: None, source }
    }
}

pub fn load_from_str(input: &str) -> Result<BumpConfig, ConfigError> {
    let config: BumpConfig = toml_edit::de::from_str(input)
        .map_err(|source| ConfigError::Toml { path: None, source })?;
    config
        .validate()
        .map_err(|source| ConfigError::Validation { path: None, source })?;
    Ok(config)
}

pub fn load_from_path(path: impl AsRef<Path>) -> Result<BumpConfig, ConfigError> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    load_from_str(&contents).map_err(|error| error.with_path(path))
}

/// Walk up from `start` looking for [`CONFIG_FILE_NAME`].
pub fn find_config(start: impl AsRef<Path>) -> Result<PathBuf, ConfigError> {
    let start = start.as_ref();
    start
        .ancestors()
        .map(|dir| dir.join(CONFIG_FILE_NAME))
        .find(|candidate| candidate.is_file())
        .ok_or_else(|| ConfigError::NotFound {
            start: start.to_path_buf(),
        })
}

/// Directory that relative `file_patterns` keys are resolved against.
pub fn config_dir(config_path: &Path) -> &Path {
    match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

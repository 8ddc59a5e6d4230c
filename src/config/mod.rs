pub mod loader;
pub mod schema;
pub mod version;

pub use loader::{config_dir, find_config, load_from_path, load_from_str, ConfigError};
pub use schema::{
    BumpConfig, Metadata, PatternCompileError, PatternSpec, ValidationError, ValidationIssue,
};
pub use version::{check_bump, parse_version, BumpVersion, VersionError};

//! Verbump: pattern-driven version rewriting
//!
//! Given a mapping from file paths to version patterns, verbump rewrites the
//! version token in every file and produces a unified diff of the change,
//! keeping each file's line separator (`\n`, `\r\n` or `\r`) intact.
//!
//! # Architecture
//!
//! - [`resolve`] checks that every configured file exists, in order.
//! - [`rewrite`] reads each file and turns it into a [`RewrittenFileData`]
//!   record of old and new lines. Unmatched patterns from every file are
//!   collected into a single [`NoPatternMatch`] error.
//! - [`diff`] renders records as unified diffs.
//! - [`persist`] writes records back to disk.
//! - [`config`] loads `verbump.toml` into a [`PatternSet`].
//!
//! # Example
//!
//! ```no_run
//! use verbump::{diff_lines, rewrite_all, LiteralPattern, PatternSet};
//!
//! let mut set = PatternSet::new();
//! set.push("Cargo.toml", LiteralPattern::new("version = \"0.1.0\"", "version = \"0.2.0\""));
//!
//! match rewrite_all(&set) {
//!     Ok(records) => {
//!         for rfd in &records {
//!             println!("{}", diff_lines(rfd).join("\n"));
//!         }
//!     }
//!     Err(e) => eprintln!("Rewrite failed: {}", e),
//! }
//! ```

pub mod cache;
pub mod config;
pub mod diff;
pub mod pattern;
pub mod persist;
pub mod resolve;
pub mod rewrite;

// Re-exports
pub use cache::{Memo, ReprMemo};
pub use config::{load_from_path, load_from_str, BumpConfig, ConfigError, VersionError};
pub use diff::{diff_all, diff_lines};
pub use pattern::{LiteralPattern, Pattern, PatternError, RegexPattern, TemplatePattern};
pub use persist::{write_all, write_rewritten, PersistError, WriteResult};
pub use resolve::{resolve, PathPatterns, PatternSet, ResolvedTarget};
pub use rewrite::{
    build_rewrite, detect_line_sep, rewrite_all, rewrite_targets, rfd_from_content, LineSep,
    NoPatternMatch, PatternFailure, RewriteError, RewrittenFileData,
};

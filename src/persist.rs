//! Writing rewrite records back to disk.
//!
//! Before a file is replaced its current content is hashed and compared to
//! the content the record was computed from, so edits made in the meantime
//! are never clobbered. New content goes to a temporary file in the same
//! directory, which is then renamed over the target.
//!
//! [`write_all`] checks and stages every record before renaming any of them.
//! A batch where one file was modified, or where two records name the same
//! file, leaves every target untouched.

use crate::rewrite::{LineSep, RewrittenFileData};
use std::collections::HashSet;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;
use xxhash_rust::xxh3::xxh3_64;

#[derive(Error, Debug)]
pub enum PersistError {
    #[error("{} changed on disk since it was read (expected hash {expected:016x}, found {found:016x})", path.display())]
    Modified {
        path: PathBuf,
        expected: u64,
        found: u64,
    },

    #[error("{} is the target of more than one record", path.display())]
    DuplicateTarget { path: PathBuf },

    #[error("File I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Outcome of writing one record.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "WriteResult should be checked for written/unchanged"]
pub enum WriteResult {
    Written { path: PathBuf, bytes: usize },
    Unchanged { path: PathBuf },
}

/// New content sitting in a temp file next to its target, not yet renamed.
#[derive(Debug)]
struct StagedWrite {
    path: PathBuf,
    temp: NamedTempFile,
    bytes: usize,
    line_sep: LineSep,
}

#[derive(Debug)]
enum Staged {
    Write(StagedWrite),
    Unchanged(PathBuf),
}

impl Staged {
    fn commit(self) -> Result<WriteResult, PersistError> {
        match self {
            Staged::Unchanged(path) => Ok(WriteResult::Unchanged { path }),
            Staged::Write(staged) => staged.commit(),
        }
    }
}

impl StagedWrite {
    fn commit(self) -> Result<WriteResult, PersistError> {
        let StagedWrite {
            path,
            temp,
            bytes,
            line_sep,
        } = self;

        temp.persist(&path).map_err(|e| PersistError::Io {
            path: path.clone(),
            source: e.error,
        })?;
        tracing::info!(
            path = %path.display(),
            line_sep = %line_sep,
            bytes,
            "updated file"
        );

        Ok(WriteResult::Written { path, bytes })
    }
}

/// Verify `rfd` against the file on disk and stage its new content.
fn stage(rfd: &RewrittenFileData) -> Result<Staged, PersistError> {
    let path = PathBuf::from(&rfd.path);
    if !rfd.is_changed() {
        tracing::debug!(path = %path.display(), "content unchanged, not writing");
        return Ok(Staged::Unchanged(path));
    }

    let io_err = |source| PersistError::Io {
        path: path.clone(),
        source,
    };

    let on_disk = fs::read(&path).map_err(io_err)?;
    let expected = xxh3_64(rfd.old_content().as_bytes());
    let found = xxh3_64(&on_disk);
    if expected != found {
        return Err(PersistError::Modified {
            path,
            expected,
            found,
        });
    }

    let content = rfd.new_content();
    let temp = stage_content(&path, content.as_bytes()).map_err(io_err)?;
    Ok(Staged::Write(StagedWrite {
        path,
        temp,
        bytes: content.len(),
        line_sep: rfd.line_sep,
    }))
}

/// Write `rfd.new_lines`, joined with the record's separator, to `rfd.path`.
pub fn write_rewritten(rfd: &RewrittenFileData) -> Result<WriteResult, PersistError> {
    stage(rfd)?.commit()
}

/// Write every record, or none of them.
///
/// All records are hash-checked and staged first; renames start only once
/// every record has passed. On error the staged temp files are removed and
/// no target is modified.
pub fn write_all(records: &[RewrittenFileData]) -> Result<Vec<WriteResult>, PersistError> {
    let mut seen = HashSet::new();
    let mut staged = Vec::with_capacity(records.len());

    for rfd in records {
        let path = Path::new(&rfd.path);
        let key = fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
        if !seen.insert(key) {
            return Err(PersistError::DuplicateTarget {
                path: path.to_path_buf(),
            });
        }
        staged.push(stage(rfd)?);
    }

    staged.into_iter().map(Staged::commit).collect()
}

/// Write `content` to a synced temp file in the directory of `path`.
fn stage_content(path: &Path, content: &[u8]) -> std::io::Result<NamedTempFile> {
    // Same directory keeps the rename on one filesystem.
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut temp = NamedTempFile::new_in(parent)?;
    temp.write_all(content)?;
    temp.as_file().sync_all()?;

    // Keep the original permissions, NamedTempFile creates files as 0600.
    if let Ok(metadata) = fs::metadata(path) {
        temp.as_file().set_permissions(metadata.permissions())?;
    }
    Ok(temp)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(path: &Path, sep: LineSep, old: &[&str], new: &[&str]) -> RewrittenFileData {
        RewrittenFileData {
            path: path.to_string_lossy().into_owned(),
            line_sep: sep,
            old_lines: old.iter().map(|s| s.to_string()).collect(),
            new_lines: new.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn file_names(dir: &Path) -> Vec<String> {
        let mut names: Vec<_> = fs::read_dir(dir)
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_write_preserves_crlf_and_trailing_separator() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("version.txt");
        fs::write(&file, "name\r\n1.0.0\r\n").unwrap();

        let rfd = record(&file, LineSep::CrLf, &["name", "1.0.0", ""], &["name", "1.1.0", ""]);
        let result = write_rewritten(&rfd).unwrap();

        assert!(matches!(result, WriteResult::Written { bytes: 13, .. }));
        assert_eq!(fs::read(&file).unwrap(), b"name\r\n1.1.0\r\n");
    }

    #[test]
    fn test_write_cr_without_trailing_separator() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("old-mac.txt");
        fs::write(&file, "a\r1.0").unwrap();

        let rfd = record(&file, LineSep::Cr, &["a", "1.0"], &["a", "2.0"]);
        write_rewritten(&rfd).unwrap();
        assert_eq!(fs::read(&file).unwrap(), b"a\r2.0");
    }

    #[test]
    fn test_unchanged_record_is_not_written() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("same.txt");
        fs::write(&file, "x").unwrap();

        let rfd = record(&file, LineSep::Lf, &["x"], &["x"]);
        assert!(matches!(
            write_rewritten(&rfd).unwrap(),
            WriteResult::Unchanged { .. }
        ));
    }

    #[test]
    fn test_refuses_to_overwrite_modified_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("racy.txt");
        fs::write(&file, "1.0.0").unwrap();
        let rfd = record(&file, LineSep::Lf, &["1.0.0"], &["2.0.0"]);

        fs::write(&file, "1.0.0-edited").unwrap();
        let err = write_rewritten(&rfd).unwrap_err();
        assert!(matches!(err, PersistError::Modified { .. }));
        assert_eq!(fs::read_to_string(&file).unwrap(), "1.0.0-edited");
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let rfd = record(&dir.path().join("gone.txt"), LineSep::Lf, &["a"], &["b"]);
        assert!(matches!(
            write_rewritten(&rfd).unwrap_err(),
            PersistError::Io { .. }
        ));
    }

    #[test]
    fn test_write_all_leaves_batch_untouched_when_later_file_modified() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.txt");
        let b = dir.path().join("b.txt");
        fs::write(&a, "1.0.0\n").unwrap();
        fs::write(&b, "1.0.0\n").unwrap();

        let records = vec![
            record(&a, LineSep::Lf, &["1.0.0", ""], &["2.0.0", ""]),
            record(&b, LineSep::Lf, &["1.0.0", ""], &["2.0.0", ""]),
        ];
        fs::write(&b, "1.0.0-local\n").unwrap();

        match write_all(&records) {
            Err(PersistError::Modified { path, .. }) => assert_eq!(path, b),
            other => panic!("expected Modified, got {other:?}"),
        }
        assert_eq!(fs::read_to_string(&a).unwrap(), "1.0.0\n");
        assert_eq!(fs::read_to_string(&b).unwrap(), "1.0.0-local\n");
        // Staged temp files are cleaned up.
        assert_eq!(file_names(dir.path()), vec!["a.txt", "b.txt"]);
    }

    #[test]
    fn test_write_all_rejects_same_file_twice() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.txt");
        fs::write(&file, "1.0.0").unwrap();
        let alias = dir.path().join(".").join("a.txt");

        let records = vec![
            record(&file, LineSep::Lf, &["1.0.0"], &["2.0.0"]),
            record(&alias, LineSep::Lf, &["1.0.0"], &["1.0.0-x"]),
        ];

        let err = write_all(&records).unwrap_err();
        assert!(matches!(err, PersistError::DuplicateTarget { .. }));
        assert_eq!(fs::read_to_string(&file).unwrap(), "1.0.0");
    }

    #[test]
    fn test_write_all_reports_each_record() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.txt");
        let b = dir.path().join("b.txt");
        fs::write(&a, "1.0.0").unwrap();
        fs::write(&b, "same").unwrap();

        let results = write_all(&[
            record(&a, LineSep::Lf, &["1.0.0"], &["2.0.0"]),
            record(&b, LineSep::Lf, &["same"], &["same"]),
        ])
        .unwrap();

        assert_eq!(
            results,
            vec![
                WriteResult::Written { path: a.clone(), bytes: 5 },
                WriteResult::Unchanged { path: b },
            ]
        );
        assert_eq!(fs::read_to_string(&a).unwrap(), "2.0.0");
    }
}

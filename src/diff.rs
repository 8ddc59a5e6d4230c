//! Unified diffs of rewrite records.
//!
//! The output follows the classic `diff -u` layout: `---`/`+++` headers
//! followed by `@@` hunks with three lines of context. A range of exactly one
//! line is written without a count (`@@ -1 +1 @@`), and an empty range is
//! written as the line before it with a count of zero.

use crate::rewrite::RewrittenFileData;
use similar::{Algorithm, ChangeTag, DiffOp, TextDiff};
use std::ops::Range;

/// Lines of unchanged context around each change.
pub const CONTEXT_LINES: usize = 3;

/// Unified diff of `rfd.old_lines` against `rfd.new_lines`.
///
/// The record's path labels both sides. Lines carry no terminators. An
/// unchanged record yields an empty vector.
pub fn diff_lines(rfd: &RewrittenFileData) -> Vec<String> {
    if !rfd.is_changed() {
        return Vec::new();
    }

    let old: Vec<&str> = rfd.old_lines.iter().map(String::as_str).collect();
    let new: Vec<&str> = rfd.new_lines.iter().map(String::as_str).collect();
    let diff = TextDiff::configure()
        .algorithm(Algorithm::Myers)
        .diff_slices(&old, &new);

    let groups = diff.grouped_ops(CONTEXT_LINES);
    if groups.is_empty() {
        return Vec::new();
    }

    let mut lines = vec![format!("--- {}", rfd.path), format!("+++ {}", rfd.path)];
    for group in &groups {
        lines.push(hunk_header(group));
        for op in group {
            for change in diff.iter_changes(op) {
                let sign = match change.tag() {
                    ChangeTag::Equal => ' ',
                    ChangeTag::Delete => '-',
                    ChangeTag::Insert => '+',
                };
                lines.push(format!("{sign}{}", change.value()));
            }
        }
    }
    lines
}

/// All per-file diffs of a batch as one text block.
///
/// Each non-empty diff is joined with `\n` and terminated by `\n`. Carriage
/// returns that belong to `\r\n` pairs are dropped for display.
pub fn diff_all<'a, I>(records: I) -> String
where
    I: IntoIterator<Item = &'a RewrittenFileData>,
{
    let mut full_diff = String::new();
    for rfd in records {
        let lines = diff_lines(rfd);
        if lines.is_empty() {
            continue;
        }
        full_diff.push_str(&lines.join("\n"));
        full_diff.push('\n');
    }
    full_diff.replace("\r\n", "\n")
}

fn hunk_header(group: &[DiffOp]) -> String {
    let (first, last) = match (group.first(), group.last()) {
        (Some(first), Some(last)) => (first, last),
        _ => return "@@ -0,0 +0,0 @@".to_string(),
    };
    let old = first.old_range().start..last.old_range().end;
    let new = first.new_range().start..last.new_range().end;
    format!("@@ -{} +{} @@", format_range(old), format_range(new))
}

fn format_range(range: Range<usize>) -> String {
    let len = range.end - range.start;
    match len {
        1 => format!("{}", range.start + 1),
        0 => format!("{},0", range.start),
        _ => format!("{},{}", range.start + 1, len),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rewrite::LineSep;

    fn rfd(old: &[&str], new: &[&str]) -> RewrittenFileData {
        RewrittenFileData {
            path: "<path>".to_string(),
            line_sep: LineSep::Lf,
            old_lines: old.iter().map(|s| s.to_string()).collect(),
            new_lines: new.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_single_line_change() {
        assert_eq!(
            diff_lines(&rfd(&["foo"], &["bar"])),
            vec!["--- <path>", "+++ <path>", "@@ -1 +1 @@", "-foo", "+bar"]
        );
    }

    #[test]
    fn test_no_change_no_diff() {
        assert!(diff_lines(&rfd(&["a", "b"], &["a", "b"])).is_empty());
        assert!(diff_lines(&rfd(&[], &[])).is_empty());
    }

    #[test]
    fn test_context_and_counts() {
        let old = ["1", "2", "3", "4", "5", "6", "7", "8", "9"];
        let mut new = old;
        new[4] = "five";
        assert_eq!(
            diff_lines(&rfd(&old, &new)),
            vec![
                "--- <path>",
                "+++ <path>",
                "@@ -2,7 +2,7 @@",
                " 2",
                " 3",
                " 4",
                "-5",
                "+five",
                " 6",
                " 7",
                " 8",
            ]
        );
    }

    #[test]
    fn test_separate_hunks() {
        let old: Vec<String> = (1..=20).map(|n| n.to_string()).collect();
        let mut new = old.clone();
        new[0] = "one".to_string();
        new[19] = "twenty".to_string();
        let record = RewrittenFileData {
            path: "<path>".to_string(),
            line_sep: LineSep::Lf,
            old_lines: old,
            new_lines: new,
        };
        let lines = diff_lines(&record);
        let headers: Vec<_> = lines.iter().filter(|l| l.starts_with("@@")).collect();
        assert_eq!(headers, vec!["@@ -1,4 +1,4 @@", "@@ -17,4 +17,4 @@"]);
    }

    #[test]
    fn test_insertion_into_empty() {
        assert_eq!(
            diff_lines(&rfd(&[], &["new"])),
            vec!["--- <path>", "+++ <path>", "@@ -0,0 +1 @@", "+new"]
        );
    }

    #[test]
    fn test_line_count_change() {
        let lines = diff_lines(&rfd(&["a", "b"], &["a", "b", "c"]));
        assert_eq!(lines[2], "@@ -1,2 +1,3 @@");
        assert_eq!(&lines[3..], &[" a", " b", "+c"]);
    }

    #[test]
    fn test_diff_all_skips_unchanged_and_normalizes_crlf() {
        let changed = rfd(&["v1\r"], &["v2\r"]);
        let unchanged = rfd(&["same"], &["same"]);
        let text = diff_all([&changed, &unchanged]);
        assert_eq!(text, "--- <path>\n+++ <path>\n@@ -1 +1 @@\n-v1\n+v2\n");
    }
}

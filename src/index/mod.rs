//! File position index: which lines of the pull request can host a comment.
//!
//! Built once per run from the changed-file list. Each file is parsed into a
//! resolvable entry (hunk window + commit SHA) or recorded as unresolvable
//! with the parse error that sank it — binary files and empty patches stay
//! in the index so the failure is visible, they just never host a comment.

use tracing::warn;

use crate::errors::{CommenterResult, Error, ParseError};
use crate::github::ChangedFile;
use crate::parser::HunkParser;

/// Commentable window and commit identity for one changed file.
///
/// Invariant: `hunk_start <= hunk_end`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePosition {
    pub filename: String,
    pub hunk_start: u64,
    pub hunk_end: u64,
    pub commit_sha: String,
}

impl FilePosition {
    /// Diff-relative offset the review API expects, not the absolute file
    /// line. Recomputed per comment, never cached across files.
    pub fn position(&self, line: u64) -> u64 {
        line - self.hunk_start
    }
}

/// A changed file whose patch or commit ref could not be parsed.
#[derive(Debug, Clone)]
pub struct UnresolvedFile {
    pub filename: String,
    pub error: ParseError,
}

/// Per-file positions for one pull request, loaded once and read-only after.
#[derive(Debug, Default)]
pub struct FilePositionIndex {
    resolvable: Vec<FilePosition>,
    unresolvable: Vec<UnresolvedFile>,
}

impl FilePositionIndex {
    /// Builds the index from the pull request's changed files. Parse
    /// failures are recorded, not fatal: the file simply can never host a
    /// comment this run.
    pub fn from_changed_files(parser: &HunkParser, files: &[ChangedFile]) -> Self {
        let mut index = Self::default();
        for file in files {
            match Self::parse_entry(parser, file) {
                Ok(pos) => index.resolvable.push(pos),
                Err(e) => {
                    warn!("load: {} is not commentable: {e}", file.filename);
                    index.unresolvable.push(UnresolvedFile {
                        filename: file.filename.clone(),
                        error: e,
                    });
                }
            }
        }
        index
    }

    fn parse_entry(parser: &HunkParser, file: &ChangedFile) -> Result<FilePosition, ParseError> {
        let patch = file.patch.as_deref().ok_or(ParseError::PatchUnresolvable)?;
        let range = parser.hunk_range(patch)?;
        let sha = parser.commit_sha(&file.contents_url)?;
        Ok(FilePosition {
            filename: file.filename.clone(),
            hunk_start: range.start,
            hunk_end: range.end,
            commit_sha: sha.to_string(),
        })
    }

    /// True iff a resolvable entry for `filename` covers `line`.
    pub fn is_relevant(&self, filename: &str, line: u64) -> bool {
        self.resolvable
            .iter()
            .any(|f| f.filename == filename && f.hunk_start <= line && line <= f.hunk_end)
    }

    /// Returns the resolvable entry covering `(filename, line)`, or
    /// `CommentNotValid` when no hunk of the pull request touches it.
    pub fn resolve(&self, filename: &str, line: u64) -> CommenterResult<&FilePosition> {
        self.resolvable
            .iter()
            .find(|f| f.filename == filename && f.hunk_start <= line && line <= f.hunk_end)
            .ok_or_else(|| Error::CommentNotValid {
                filename: filename.to_string(),
                line,
            })
    }

    pub fn resolvable_count(&self) -> usize {
        self.resolvable.len()
    }

    pub fn unresolvable(&self) -> &[UnresolvedFile] {
        &self.unresolvable
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn changed(filename: &str, patch: Option<&str>, sha: &str) -> ChangedFile {
        ChangedFile {
            filename: filename.to_string(),
            status: "modified".to_string(),
            patch: patch.map(str::to_string),
            contents_url: format!(
                "https://api.github.com/repos/o/r/contents/{filename}?ref={sha}"
            ),
        }
    }

    fn index(files: &[ChangedFile]) -> FilePositionIndex {
        FilePositionIndex::from_changed_files(&HunkParser::new(), files)
    }

    #[test]
    fn relevance_inside_first_hunk_window() {
        let idx = index(&[changed("main.tf", Some("@@ -10,5 +10,8 @@\n+x\n"), "abc123")]);

        assert!(idx.is_relevant("main.tf", 10));
        assert!(idx.is_relevant("main.tf", 12));
        assert!(idx.is_relevant("main.tf", 17));
        assert!(!idx.is_relevant("main.tf", 9));
        assert!(!idx.is_relevant("main.tf", 18));
        assert!(!idx.is_relevant("main.tf", 30));
        assert!(!idx.is_relevant("other.tf", 12));
    }

    #[test]
    fn missing_patch_marks_file_unresolvable() {
        let idx = index(&[changed("logo.png", None, "abc123")]);

        assert_eq!(idx.resolvable_count(), 0);
        assert_eq!(idx.unresolvable().len(), 1);
        assert_eq!(idx.unresolvable()[0].error, ParseError::PatchUnresolvable);
        for line in [0, 1, 10, 1000] {
            assert!(!idx.is_relevant("logo.png", line));
        }
    }

    #[test]
    fn parse_failure_does_not_sink_other_files() {
        let idx = index(&[
            changed("logo.png", None, "abc123"),
            changed("main.tf", Some("@@ -1,2 +1,4 @@\n+x\n"), "abc123"),
        ]);

        assert_eq!(idx.resolvable_count(), 1);
        assert_eq!(idx.unresolvable().len(), 1);
        assert!(idx.is_relevant("main.tf", 3));
    }

    #[test]
    fn resolve_returns_sha_and_position() {
        let idx = index(&[changed("main.tf", Some("@@ -10,5 +10,8 @@\n+x\n"), "f3a1c9")]);

        let pos = idx.resolve("main.tf", 12).unwrap();
        assert_eq!(pos.commit_sha, "f3a1c9");
        assert_eq!(pos.position(12), 2);

        match idx.resolve("main.tf", 30) {
            Err(Error::CommentNotValid { filename, line }) => {
                assert_eq!(filename, "main.tf");
                assert_eq!(line, 30);
            }
            other => panic!("expected CommentNotValid, got {other:?}"),
        }
    }
}

//! Unified-diff hunk header parsing.
//!
//! GitHub's list-files endpoint returns, per changed file, the unified diff
//! text (`patch`) and a `contents_url` whose `ref=` query pins the blob to
//! the head commit. This module recovers from those two strings everything a
//! review comment needs to anchor: the commentable line window introduced by
//! the diff, and the commit SHA.
//!
//! Only the first hunk header is consulted. Files with several hunks are
//! commentable within the first hunk's window only — a known limitation of
//! the position arithmetic, kept deliberately rather than silently extended.

use regex::Regex;

use crate::errors::ParseError;

/// Inclusive range of new-side line numbers introduced by the first hunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HunkRange {
    pub start: u64,
    pub end: u64,
}

/// Compiled patterns for hunk headers and commit refs.
///
/// Built once and passed by reference wherever parsing happens; there is no
/// package-level pattern state.
#[derive(Debug)]
pub struct HunkParser {
    patch_re: Regex,
    commit_ref_re: Regex,
}

impl HunkParser {
    pub fn new() -> Self {
        Self {
            // `@@ -a,b +c,d @@`; the count on either side may be omitted,
            // which means the hunk covers exactly one line.
            patch_re: Regex::new(r"^@@ -\d+(?:,\d+)? \+(\d+)(?:,(\d+))? @@").unwrap(),
            commit_ref_re: Regex::new(r"[?&]ref=([0-9a-fA-F]+)").unwrap(),
        }
    }

    /// Extracts the new-side line window of the first hunk of `patch`.
    ///
    /// `@@ -a,b +c,d @@` yields `(c, c + d - 1)`; `@@ -a +c @@` yields
    /// `(c, c)`. An empty patch, a patch without a hunk header, or a hunk
    /// that adds no new-side lines (`d == 0`) is unresolvable.
    pub fn hunk_range(&self, patch: &str) -> Result<HunkRange, ParseError> {
        let caps = self
            .patch_re
            .captures(patch)
            .ok_or(ParseError::PatchUnresolvable)?;

        let start: u64 = caps[1].parse().map_err(|_| ParseError::PatchUnresolvable)?;
        let count: u64 = match caps.get(2) {
            Some(m) => m.as_str().parse().map_err(|_| ParseError::PatchUnresolvable)?,
            None => 1,
        };
        if count == 0 {
            // Pure-deletion hunk: no new-side line can host a comment.
            return Err(ParseError::PatchUnresolvable);
        }

        Ok(HunkRange {
            start,
            end: start + (count - 1),
        })
    }

    /// Recovers the commit SHA from a file's contents URL (`...?ref=<sha>`).
    pub fn commit_sha<'a>(&self, contents_url: &'a str) -> Result<&'a str, ParseError> {
        self.commit_ref_re
            .captures(contents_url)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
            .ok_or(ParseError::ShaUnresolvable)
    }
}

impl Default for HunkParser {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_with_counts() {
        let p = HunkParser::new();
        let r = p.hunk_range("@@ -10,5 +10,8 @@ fn main() {\n+line\n").unwrap();
        assert_eq!(r, HunkRange { start: 10, end: 17 });
    }

    #[test]
    fn header_without_count_covers_one_line() {
        let p = HunkParser::new();
        let r = p.hunk_range("@@ -3 +42 @@\n+only\n").unwrap();
        assert_eq!(r, HunkRange { start: 42, end: 42 });

        // Omitted count on the old side only.
        let r = p.hunk_range("@@ -3 +42,2 @@\n+a\n+b\n").unwrap();
        assert_eq!(r, HunkRange { start: 42, end: 43 });
    }

    #[test]
    fn empty_patch_is_unresolvable() {
        let p = HunkParser::new();
        assert_eq!(p.hunk_range(""), Err(ParseError::PatchUnresolvable));
        assert_eq!(
            p.hunk_range("Binary files a/x.png and b/x.png differ"),
            Err(ParseError::PatchUnresolvable)
        );
    }

    #[test]
    fn zero_count_hunk_is_unresolvable() {
        let p = HunkParser::new();
        assert_eq!(
            p.hunk_range("@@ -4,3 +3,0 @@\n-gone\n"),
            Err(ParseError::PatchUnresolvable)
        );
    }

    #[test]
    fn only_first_hunk_is_used() {
        let p = HunkParser::new();
        let patch = "@@ -1,2 +1,3 @@\n+a\n b\n c\n@@ -10,2 +11,5 @@\n+d\n";
        let r = p.hunk_range(patch).unwrap();
        assert_eq!(r, HunkRange { start: 1, end: 3 });
    }

    #[test]
    fn commit_sha_from_contents_url() {
        let p = HunkParser::new();
        let url = "https://api.github.com/repos/o/r/contents/main.tf?ref=f3a1c9d2e4b5";
        assert_eq!(p.commit_sha(url).unwrap(), "f3a1c9d2e4b5");
    }

    #[test]
    fn missing_ref_is_unresolvable() {
        let p = HunkParser::new();
        assert_eq!(
            p.commit_sha("https://api.github.com/repos/o/r/contents/main.tf"),
            Err(ParseError::ShaUnresolvable)
        );
    }
}

//! Candidate review comments: wire shape plus the pure builder that turns a
//! finding and its resolved file position into one.

use crate::findings::Finding;
use crate::index::FilePosition;

/// A review comment ready for submission. Built per finding, discarded after.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateComment {
    pub filename: String,
    /// Anchor line: the finding's end line.
    pub line: u64,
    /// Set only for multi-line findings (`start_line != end_line`).
    pub start_line: Option<u64>,
    /// Diff-relative offset, computed against `line`.
    pub position: u64,
    pub commit_sha: String,
    pub body: String,
}

/// Builds the wire-shape comment for a finding whose both endpoints were
/// already checked relevant. `info` must be the entry resolved for the
/// finding's end line.
pub fn build_comment(finding: &Finding, info: &FilePosition) -> CandidateComment {
    let start = finding.location.start_line;
    let end = finding.location.end_line;

    CandidateComment {
        filename: info.filename.clone(),
        line: end,
        start_line: (start != end).then_some(start),
        position: info.position(end),
        commit_sha: info.commit_sha.clone(),
        body: render_body(finding),
    }
}

/// Renders the human-readable comment body.
///
/// A single reference link is folded into the closing sentence; several are
/// listed as bullets. The template is presentation, not contract — dedup
/// compares the rendered string byte for byte.
pub fn render_body(finding: &Finding) -> String {
    let mut body = format!(
        "Check {} failed ({}).\n\n{}\n",
        finding.rule_id,
        severity_label(&finding.severity),
        finding.description.trim()
    );

    match finding.links.as_slice() {
        [] => {}
        [link] => {
            body.push_str(&format!("\nFor more information, see {link}.\n"));
        }
        links => {
            body.push_str("\nReferences:\n");
            for link in links {
                body.push_str(&format!("- {link}\n"));
            }
        }
    }
    body
}

fn severity_label(severity: &str) -> &str {
    if severity.is_empty() {
        "unknown severity"
    } else {
        severity
    }
}

//! GitHub REST facade: wire types, the HTTP client, and the retrying writer.
//!
//! The rest of the crate only sees the narrow surface here — list changed
//! files, list existing comments, create/edit a review comment, create an
//! issue comment — so the mapping/dedup core stays independent of transport
//! details.

pub mod client;
pub mod retry;

pub use client::GitHubClient;

use std::fmt;

use serde::Deserialize;

/// A unique reference to a pull request: `owner/repo` plus the PR number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequestRef {
    pub owner: String,
    pub repo: String,
    pub number: u64,
}

impl fmt::Display for PullRequestRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}#{}", self.owner, self.repo, self.number)
    }
}

/// One entry of the pull request's changed-file list.
///
/// `patch` is the unified diff text; GitHub omits it for binary files.
/// `contents_url` carries the `ref=<sha>` query the comment must anchor to.
#[derive(Debug, Clone, Deserialize)]
pub struct ChangedFile {
    pub filename: String,
    pub status: String,
    #[serde(default)]
    pub patch: Option<String>,
    pub contents_url: String,
}

/// Snapshot of a review comment already present on the pull request.
/// Read-only; used only for exact-equality dedup within the current run.
#[derive(Debug, Clone)]
pub struct ExistingComment {
    pub filename: String,
    pub body: String,
    pub comment_id: u64,
}

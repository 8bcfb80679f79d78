//! pr-commenter: posts static-analysis findings as review comments on a
//! GitHub pull request.
//!
//! Pipeline for one run:
//!
//! 1) **Load (lazy, once)** — fetch the PR's changed-file list and parse
//!    each file's first diff hunk into a commentable line window plus the
//!    commit SHA to anchor to; snapshot the comments already on the PR.
//! 2) **Map** — for each finding, check that both endpoints of its line
//!    range fall inside a resolvable hunk window and compute the
//!    diff-relative position the review API expects.
//! 3) **Dedup** — exact `(filename, body)` equality against the snapshot
//!    and against bodies written earlier in the same run.
//! 4) **Write** — create (or edit) the comment through a bounded retry
//!    loop that backs off quadratically on the secondary rate limit.
//!
//! Findings that fall outside the diff are expected and benign; they are
//! counted, not failed. Hard write errors accumulate in the `RunSummary`
//! and never abort the run. The crate uses `tracing` for logging and avoids
//! `async-trait` and heap trait objects; the GitHub client is a plain
//! struct and the retrying writer is generic over its write closure.

pub mod comment;
pub mod config;
pub mod errors;
pub mod findings;
pub mod github;
pub mod index;
pub mod parser;
pub mod publish;

pub use comment::{CandidateComment, build_comment, render_body};
pub use config::{CommenterConfig, DedupMode};
pub use errors::{CommenterResult, Error};
pub use findings::{Finding, FindingLocation, load_findings, strip_workspace_prefix};
pub use github::{GitHubClient, PullRequestRef};
pub use index::{FilePosition, FilePositionIndex};
pub use parser::HunkParser;
pub use publish::{Commenter, RunSummary, WriteAction};

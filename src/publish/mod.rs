//! Publisher: drives findings through relevance → build → dedup → write.
//!
//! The `Commenter` loads the pull request exactly once, lazily, on the first
//! write: the changed-file position index plus a snapshot of the comments
//! already present. Both are deliberate consistency snapshots, never
//! refreshed mid-run. A load failure is fatal and poisons the instance.
//!
//! Per finding: check relevance for both endpoints, build the candidate,
//! dedup against the snapshot and against bodies written earlier in this
//! run, then write through the retrying writer. Hard errors accumulate in
//! the run summary; processing always continues to the next finding.

use std::collections::HashSet;
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::comment::{CandidateComment, build_comment};
use crate::config::{CommenterConfig, DedupMode};
use crate::errors::{CommenterResult, Error};
use crate::findings::Finding;
use crate::github::retry::{tokio_sleep, write_with_retries};
use crate::github::{ExistingComment, GitHubClient, PullRequestRef};
use crate::index::FilePositionIndex;
use crate::parser::HunkParser;

/// What a successful write did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteAction {
    Created,
    Edited,
}

/// Aggregate outcome of one run over all findings.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub written: usize,
    pub edited: usize,
    /// Dedup hits — idempotent successes unless the operator opts otherwise.
    pub already_written: usize,
    /// Findings whose lines fall outside the diff. Expected and benign.
    pub not_valid: usize,
    /// Hard per-finding errors, surfaced in aggregate at the end.
    pub errors: Vec<Error>,
}

impl RunSummary {
    /// True when at least one comment was written, edited, or found present.
    pub fn did_work(&self) -> bool {
        self.written + self.edited + self.already_written > 0
    }

    /// Whether the run counts as failed for exit-status purposes.
    pub fn is_failure(&self, fail_on_duplicate: bool) -> bool {
        !self.errors.is_empty() || (fail_on_duplicate && self.already_written > 0)
    }
}

enum LoadState {
    Unloaded,
    Loaded(Snapshot),
    /// A load failed; the instance must not be reused.
    Poisoned(String),
}

struct Snapshot {
    index: FilePositionIndex,
    existing: Vec<ExistingComment>,
    /// `(filename, body)` keys written (or confirmed present) this run, so
    /// identical candidates within one run still deduplicate.
    written: HashSet<(String, String)>,
}

/// Orchestrates posting findings as review comments on one pull request.
pub struct Commenter {
    client: GitHubClient,
    pr: PullRequestRef,
    parser: HunkParser,
    dedup_mode: DedupMode,
    abuse_retry_attempts: usize,
    state: LoadState,
}

impl Commenter {
    /// Probes the pull request and prepares an unloaded commenter. The file
    /// index and comment snapshot are fetched on the first write.
    pub async fn new(
        client: GitHubClient,
        pr: PullRequestRef,
        config: &CommenterConfig,
    ) -> CommenterResult<Self> {
        if let Err(e) = client.pull_request_exists(&pr).await {
            return Err(Error::PullRequestLoadFailed {
                pull_request: pr.to_string(),
                reason: e.to_string(),
            });
        }
        Ok(Self {
            client,
            pr,
            parser: HunkParser::new(),
            dedup_mode: config.dedup_mode,
            abuse_retry_attempts: config.abuse_retry_attempts,
            state: LoadState::Unloaded,
        })
    }

    /// Posts every finding, classifying outcomes into the run summary.
    /// Only a pull-request load failure aborts the run.
    pub async fn post_findings(&mut self, findings: &[Finding]) -> CommenterResult<RunSummary> {
        let t0 = Instant::now();
        info!("publish: start {} findings on {}", findings.len(), self.pr);

        let mut summary = RunSummary::default();
        for finding in findings {
            let loc = &finding.location;
            debug!(
                "publish: {} at {}:{}-{}",
                finding.rule_id, loc.filename, loc.start_line, loc.end_line
            );
            match self.post_finding(finding).await {
                Ok(WriteAction::Created) => summary.written += 1,
                Ok(WriteAction::Edited) => summary.edited += 1,
                Err(Error::CommentNotValid { filename, line }) => {
                    debug!("publish: not valid for this PR: {filename}:{line}");
                    summary.not_valid += 1;
                }
                Err(Error::CommentAlreadyWritten { filename }) => {
                    debug!("publish: already written: {filename}");
                    summary.already_written += 1;
                }
                Err(e @ Error::PullRequestLoadFailed { .. }) => return Err(e),
                Err(e) => {
                    warn!("publish: {e}");
                    summary.errors.push(e);
                }
            }
        }

        info!(
            "publish: done created={} edited={} duplicate={} not_valid={} errors={} in {} ms",
            summary.written,
            summary.edited,
            summary.already_written,
            summary.not_valid,
            summary.errors.len(),
            t0.elapsed().as_millis()
        );
        Ok(summary)
    }

    /// Posts a single finding as a review comment.
    ///
    /// Returns `CommentNotValid` when the finding's lines fall outside every
    /// resolvable hunk, `CommentAlreadyWritten` on a dedup hit in skip mode,
    /// and the write error otherwise.
    pub async fn post_finding(&mut self, finding: &Finding) -> CommenterResult<WriteAction> {
        self.ensure_loaded().await?;
        let LoadState::Loaded(snapshot) = &self.state else {
            return Err(Error::PullRequestLoadFailed {
                pull_request: self.pr.to_string(),
                reason: "commenter state lost after load".to_string(),
            });
        };

        let loc = &finding.location;
        if !snapshot.index.is_relevant(&loc.filename, loc.start_line)
            || !snapshot.index.is_relevant(&loc.filename, loc.end_line)
        {
            return Err(Error::CommentNotValid {
                filename: loc.filename.clone(),
                line: loc.start_line,
            });
        }

        let info = snapshot.index.resolve(&loc.filename, loc.end_line)?;
        let candidate = build_comment(finding, info);
        let decision = decide(&candidate, &snapshot.existing, &snapshot.written, self.dedup_mode);
        let key = (candidate.filename.clone(), candidate.body.clone());

        let action = match decision {
            WriteDecision::Skip => {
                return Err(Error::CommentAlreadyWritten {
                    filename: candidate.filename,
                });
            }
            WriteDecision::Edit(comment_id) => {
                write_with_retries(
                    &self.pr,
                    self.abuse_retry_attempts,
                    || self.client.edit_comment(&self.pr, comment_id, &candidate.body),
                    tokio_sleep,
                )
                .await?;
                WriteAction::Edited
            }
            WriteDecision::Create => {
                write_with_retries(
                    &self.pr,
                    self.abuse_retry_attempts,
                    || self.client.create_review_comment(&self.pr, &candidate),
                    tokio_sleep,
                )
                .await?;
                WriteAction::Created
            }
        };

        if let LoadState::Loaded(snapshot) = &mut self.state {
            snapshot.written.insert(key);
        }
        Ok(action)
    }

    /// Writes a general, non-line-anchored comment on the pull request.
    pub async fn post_general_comment(&mut self, body: &str) -> CommenterResult<()> {
        self.ensure_loaded().await?;
        write_with_retries(
            &self.pr,
            self.abuse_retry_attempts,
            || self.client.create_issue_comment(&self.pr, body),
            tokio_sleep,
        )
        .await
    }

    async fn ensure_loaded(&mut self) -> CommenterResult<()> {
        match &self.state {
            LoadState::Loaded(_) => return Ok(()),
            LoadState::Poisoned(reason) => {
                return Err(Error::PullRequestLoadFailed {
                    pull_request: self.pr.to_string(),
                    reason: reason.clone(),
                });
            }
            LoadState::Unloaded => {}
        }

        info!("load: fetching changed files and comments for {}", self.pr);
        let files = match self.client.list_changed_files(&self.pr).await {
            Ok(files) => files,
            Err(e) => return Err(self.poison(e.to_string())),
        };
        let existing = match self.client.list_existing_comments(&self.pr).await {
            Ok(comments) => comments,
            Err(e) => return Err(self.poison(e.to_string())),
        };

        let index = FilePositionIndex::from_changed_files(&self.parser, &files);
        info!(
            "load: {} commentable files, {} unresolvable, {} existing comments",
            index.resolvable_count(),
            index.unresolvable().len(),
            existing.len()
        );
        self.state = LoadState::Loaded(Snapshot {
            index,
            existing,
            written: HashSet::new(),
        });
        Ok(())
    }

    fn poison(&mut self, reason: String) -> Error {
        self.state = LoadState::Poisoned(reason.clone());
        Error::PullRequestLoadFailed {
            pull_request: self.pr.to_string(),
            reason,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WriteDecision {
    Create,
    Edit(u64),
    Skip,
}

/// Dedup decision for one candidate: exact `(filename, body)` equality, no
/// normalization. Differing whitespace is a different comment.
fn decide(
    candidate: &CandidateComment,
    existing: &[ExistingComment],
    written_this_run: &HashSet<(String, String)>,
    mode: DedupMode,
) -> WriteDecision {
    if written_this_run.contains(&(candidate.filename.clone(), candidate.body.clone())) {
        return WriteDecision::Skip;
    }
    match existing
        .iter()
        .find(|c| c.filename == candidate.filename && c.body == candidate.body)
    {
        Some(hit) => match mode {
            DedupMode::Skip => WriteDecision::Skip,
            DedupMode::Edit => WriteDecision::Edit(hit.comment_id),
        },
        None => WriteDecision::Create,
    }
}

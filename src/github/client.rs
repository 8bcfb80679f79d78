//! GitHub REST v3 client for pull-request review comments.
//!
//! Endpoints used:
//! - GET   /repos/:owner/:repo/pulls/:number            (existence probe)
//! - GET   /repos/:owner/:repo/pulls/:number/files
//! - GET   /repos/:owner/:repo/pulls/:number/comments
//! - POST  /repos/:owner/:repo/pulls/:number/comments
//! - PATCH /repos/:owner/:repo/pulls/comments/:id
//! - POST  /repos/:owner/:repo/issues/:number/comments
//!
//! The base API URL is configurable so GitHub Enterprise installs work too.

use std::time::Duration;

use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue, RETRY_AFTER, USER_AGENT};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::comment::CandidateComment;
use crate::errors::{CommenterResult, ConfigError, Error, ProviderError};
use crate::github::{ChangedFile, ExistingComment, PullRequestRef};

#[derive(Debug, Clone)]
pub struct GitHubClient {
    http: reqwest::Client,
    base_api: String, // e.g. "https://api.github.com"
}

impl GitHubClient {
    /// Constructs a client with auth and timeouts baked in.
    pub fn new(base_api: &str, token: &str) -> CommenterResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static("pr-commenter/0.1"));
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(
            "x-github-api-version",
            HeaderValue::from_static("2022-11-28"),
        );
        let mut auth = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|e| Error::Config(ConfigError::InvalidToken(e.to_string())))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            http,
            base_api: base_api.trim_end_matches('/').to_string(),
        })
    }

    /// Cheap probe that the pull request exists and the token can see it.
    pub async fn pull_request_exists(&self, pr: &PullRequestRef) -> Result<(), ProviderError> {
        let url = format!(
            "{}/repos/{}/{}/pulls/{}",
            self.base_api, pr.owner, pr.repo, pr.number
        );
        let resp = self.http.get(&url).send().await?;
        expect_success(resp).await
    }

    /// Fetches the changed-file list, excluding deleted entries.
    pub async fn list_changed_files(
        &self,
        pr: &PullRequestRef,
    ) -> Result<Vec<ChangedFile>, ProviderError> {
        let url = format!(
            "{}/repos/{}/{}/pulls/{}/files?per_page=100",
            self.base_api, pr.owner, pr.repo, pr.number
        );
        let files: Vec<ChangedFile> = self.get_json(&url).await?;
        Ok(files.into_iter().filter(|f| f.status != "deleted").collect())
    }

    /// Fetches the review comments already present on the pull request.
    pub async fn list_existing_comments(
        &self,
        pr: &PullRequestRef,
    ) -> Result<Vec<ExistingComment>, ProviderError> {
        #[derive(Deserialize)]
        struct ReviewComment {
            id: u64,
            path: String,
            body: String,
        }

        let url = format!(
            "{}/repos/{}/{}/pulls/{}/comments?per_page=100",
            self.base_api, pr.owner, pr.repo, pr.number
        );
        let raw: Vec<ReviewComment> = self.get_json(&url).await?;
        Ok(raw
            .into_iter()
            .map(|c| ExistingComment {
                filename: c.path,
                body: c.body,
                comment_id: c.id,
            })
            .collect())
    }

    /// Creates a positioned review comment on the pull request.
    pub async fn create_review_comment(
        &self,
        pr: &PullRequestRef,
        comment: &CandidateComment,
    ) -> Result<(), ProviderError> {
        #[derive(serde::Serialize)]
        struct Req<'a> {
            body: &'a str,
            commit_id: &'a str,
            path: &'a str,
            line: u64,
            #[serde(skip_serializing_if = "Option::is_none")]
            start_line: Option<u64>,
            position: u64,
        }

        let url = format!(
            "{}/repos/{}/{}/pulls/{}/comments",
            self.base_api, pr.owner, pr.repo, pr.number
        );
        let req = Req {
            body: &comment.body,
            commit_id: &comment.commit_sha,
            path: &comment.filename,
            line: comment.line,
            start_line: comment.start_line,
            position: comment.position,
        };

        debug!(
            "write: create path={} line={} position={}",
            comment.filename, comment.line, comment.position
        );
        let resp = self.http.post(&url).json(&req).send().await?;
        expect_success(resp).await
    }

    /// Replaces the body of an existing review comment.
    pub async fn edit_comment(
        &self,
        pr: &PullRequestRef,
        comment_id: u64,
        body: &str,
    ) -> Result<(), ProviderError> {
        #[derive(serde::Serialize)]
        struct Req<'a> {
            body: &'a str,
        }

        let url = format!(
            "{}/repos/{}/{}/pulls/comments/{}",
            self.base_api, pr.owner, pr.repo, comment_id
        );
        debug!("write: edit comment_id={comment_id}");
        let resp = self.http.patch(&url).json(&Req { body }).send().await?;
        expect_success(resp).await
    }

    /// Creates a general, non-line-anchored comment on the pull request.
    pub async fn create_issue_comment(
        &self,
        pr: &PullRequestRef,
        body: &str,
    ) -> Result<(), ProviderError> {
        #[derive(serde::Serialize)]
        struct Req<'a> {
            body: &'a str,
        }

        let url = format!(
            "{}/repos/{}/{}/issues/{}/comments",
            self.base_api, pr.owner, pr.repo, pr.number
        );
        debug!("write: general comment on {pr}");
        let resp = self.http.post(&url).json(&Req { body }).send().await?;
        expect_success(resp).await
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, ProviderError> {
        let resp = self.http.get(url).send().await?;
        if !resp.status().is_success() {
            return Err(status_error(&resp));
        }
        resp.json::<T>()
            .await
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))
    }
}

/// Drains a write response, mapping non-success statuses by class.
async fn expect_success(resp: reqwest::Response) -> Result<(), ProviderError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(());
    }
    let err = status_error(&resp);
    if let Ok(body) = resp.text().await {
        debug!("write: status={} body={}", status, body);
    }
    Err(err)
}

/// Maps a non-success response by status class, carrying the `Retry-After`
/// hint along when the primary rate limit fired.
fn status_error(resp: &reqwest::Response) -> ProviderError {
    let retry_after = resp
        .headers()
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok());
    classify_status(resp.status().as_u16(), retry_after)
}

fn classify_status(code: u16, retry_after: Option<&str>) -> ProviderError {
    if code == 429 {
        return ProviderError::RateLimited {
            retry_after_secs: retry_after.and_then(|v| v.parse().ok()),
        };
    }
    ProviderError::from_status(code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_limited_status_carries_retry_after_hint() {
        assert!(matches!(
            classify_status(429, Some("30")),
            ProviderError::RateLimited {
                retry_after_secs: Some(30)
            }
        ));
        assert!(matches!(
            classify_status(429, None),
            ProviderError::RateLimited {
                retry_after_secs: None
            }
        ));
        // Malformed header values degrade to no hint, not an error.
        assert!(matches!(
            classify_status(429, Some("soon")),
            ProviderError::RateLimited {
                retry_after_secs: None
            }
        ));
    }

    #[test]
    fn other_statuses_map_by_class() {
        assert!(matches!(
            classify_status(422, None),
            ProviderError::SecondaryRateLimit
        ));
        assert!(matches!(classify_status(502, None), ProviderError::Server(502)));
        assert!(matches!(classify_status(404, None), ProviderError::NotFound));
    }
}

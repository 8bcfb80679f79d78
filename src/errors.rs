//! Crate-wide error hierarchy for pr-commenter.
//!
//! Goals:
//! - Single root `Error` for all public functions.
//! - Per-comment outcomes carried as tagged variants (`CommentNotValid`,
//!   `CommentAlreadyWritten`, `AbuseRateLimitExhausted`) so callers classify
//!   by kind instead of downcasting.
//! - Provider-aware status mapping (401→Unauthorized, 422→SecondaryRateLimit,
//!   5xx→Server, etc.).
//! - No dynamic dispatch, ergonomic `?` via `From` impls.

use thiserror::Error;

/// Convenient alias for crate-wide results.
pub type CommenterResult<T> = Result<T, Error>;

/// Root error type for the pr-commenter crate.
#[derive(Debug, Error)]
pub enum Error {
    /// GitHub API related failure (transport or unexpected status).
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// Patch/commit-ref parsing failure for a single changed file.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// Configuration problems (bad/missing token, repository, event payload).
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Results-file loading failure (I/O or JSON).
    #[error(transparent)]
    Findings(#[from] FindingsError),

    /// The pull request's file list or comment snapshot could not be loaded.
    /// Fatal for the run; the commenter instance must not be reused.
    #[error("pull request {pull_request} could not be loaded: {reason}")]
    PullRequestLoadFailed {
        pull_request: String,
        reason: String,
    },

    /// The finding's lines fall outside every resolvable hunk for that file.
    /// Expected and benign for findings untouched by the diff.
    #[error("there is nothing to comment on at line {line} in file {filename}")]
    CommentNotValid { filename: String, line: u64 },

    /// An identical comment already exists on the pull request (or was
    /// written earlier in this run). Idempotent outcome, counted as success.
    #[error("the file {filename} already has this comment written")]
    CommentAlreadyWritten { filename: String },

    /// All retries on the secondary rate limit were exhausted for one write.
    /// Fatal to that write only; the run carries on with remaining findings.
    #[error(
        "abuse rate limit still hit on {pull_request} after {attempts} attempts \
         (last backoff {last_backoff_secs}s)"
    )]
    AbuseRateLimitExhausted {
        pull_request: String,
        attempts: usize,
        last_backoff_secs: u64,
    },
}

/// Detailed provider-specific error used inside the GitHub client layer.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Unauthorized (HTTP 401).
    #[error("unauthorized")]
    Unauthorized,

    /// Forbidden (HTTP 403).
    #[error("forbidden")]
    Forbidden,

    /// Not found (HTTP 404).
    #[error("not found")]
    NotFound,

    /// Secondary ("abuse") rate limit on write endpoints (HTTP 422).
    /// The retrying writer backs off on exactly this class.
    #[error("secondary rate limit")]
    SecondaryRateLimit,

    /// Primary rate limit (HTTP 429).
    #[error("rate limited")]
    RateLimited { retry_after_secs: Option<u64> },

    /// Gateway/Server error (HTTP 5xx).
    #[error("server error: status {0}")]
    Server(u16),

    /// Other HTTP status (4xx/3xx) not covered above.
    #[error("http status error: {0}")]
    HttpStatus(u16),

    /// Timeout at transport level.
    #[error("timeout")]
    Timeout,

    /// Network/transport failure without status (DNS/connect/reset).
    #[error("network error: {0}")]
    Network(String),

    /// Unexpected/invalid shape of a provider response.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl ProviderError {
    /// Maps a non-success HTTP status to the matching variant.
    pub fn from_status(code: u16) -> Self {
        match code {
            401 => ProviderError::Unauthorized,
            403 => ProviderError::Forbidden,
            404 => ProviderError::NotFound,
            422 => ProviderError::SecondaryRateLimit,
            429 => ProviderError::RateLimited {
                retry_after_secs: None,
            },
            500..=599 => ProviderError::Server(code),
            _ => ProviderError::HttpStatus(code),
        }
    }
}

/// Per-file patch parsing errors. A file that fails parsing stays in the
/// index as permanently unresolvable for the run; it never hosts a comment.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// The unified-diff text is absent (binary file) or has no hunk header.
    #[error("the patch details could not be resolved")]
    PatchUnresolvable,

    /// The file's contents URL carries no `ref=<sha>` query.
    #[error("the commit sha details could not be resolved")]
    ShaUnresolvable,
}

/// Configuration and setup errors (token, repository, event payload).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("the INPUT_GITHUB_TOKEN has not been set")]
    MissingToken,

    #[error("invalid token: {0}")]
    InvalidToken(String),

    #[error("invalid repository {0:?}, expected owner/repo")]
    InvalidRepository(String),

    #[error("invalid dedup mode {0:?}, expected \"skip\" or \"edit\"")]
    InvalidDedupMode(String),

    #[error("unable to get the pull request number: {0}")]
    InvalidEventPayload(String),
}

/// Results-file related errors.
#[derive(Debug, Error)]
pub enum FindingsError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serde error: {0}")]
    Serde(#[from] serde_json::Error),
}

// ===== Conversions for `?` ergonomics =====

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Provider(ProviderError::from(e))
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            return ProviderError::Timeout;
        }
        if let Some(status) = e.status() {
            return ProviderError::from_status(status.as_u16());
        }
        if e.is_decode() {
            return ProviderError::InvalidResponse(e.to_string());
        }
        ProviderError::Network(e.to_string())
    }
}

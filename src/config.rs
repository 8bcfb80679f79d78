//! Runtime configuration, read from the GitHub Actions environment.

use std::path::Path;
use std::str::FromStr;

use crate::errors::ConfigError;
use crate::github::retry::ABUSE_LIMIT_ATTEMPTS;

/// What to do when a candidate comment already exists on the pull request
/// with an identical body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DedupMode {
    /// Leave the existing comment untouched and report `CommentAlreadyWritten`.
    #[default]
    Skip,
    /// Re-send the body against the existing comment id (body-replace).
    Edit,
}

impl FromStr for DedupMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "skip" => Ok(DedupMode::Skip),
            "edit" => Ok(DedupMode::Edit),
            other => Err(ConfigError::InvalidDedupMode(other.to_string())),
        }
    }
}

/// Commenter runtime configuration.
#[derive(Debug, Clone)]
pub struct CommenterConfig {
    /// API base, e.g. "https://api.github.com" or an Enterprise install.
    pub base_api: String,
    pub token: String,
    pub dedup_mode: DedupMode,
    /// Fold `CommentAlreadyWritten` outcomes into the failing exit path.
    pub fail_on_duplicate: bool,
    /// Attempts per write while the secondary rate limit keeps firing.
    pub abuse_retry_attempts: usize,
}

impl CommenterConfig {
    /// Reads the configuration from the environment.
    ///
    /// `INPUT_GITHUB_TOKEN` is required; everything else has defaults:
    /// `GITHUB_API_URL`, `INPUT_DEDUP_MODE` (skip|edit),
    /// `INPUT_FAIL_ON_DUPLICATE`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let token = std::env::var("INPUT_GITHUB_TOKEN")
            .ok()
            .filter(|t| !t.is_empty())
            .ok_or(ConfigError::MissingToken)?;

        let dedup_mode = match std::env::var("INPUT_DEDUP_MODE") {
            Ok(raw) if !raw.is_empty() => raw.parse()?,
            _ => DedupMode::default(),
        };

        Ok(Self {
            base_api: std::env::var("GITHUB_API_URL")
                .unwrap_or_else(|_| "https://api.github.com".to_string()),
            token,
            dedup_mode,
            fail_on_duplicate: env_bool("INPUT_FAIL_ON_DUPLICATE", false),
            abuse_retry_attempts: ABUSE_LIMIT_ATTEMPTS,
        })
    }
}

fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}

/// Splits `GITHUB_REPOSITORY`-style `owner/repo` values.
pub fn parse_repository(raw: &str) -> Result<(String, String), ConfigError> {
    let (owner, repo) = raw
        .split_once('/')
        .ok_or_else(|| ConfigError::InvalidRepository(raw.to_string()))?;
    if owner.is_empty() || repo.is_empty() || repo.contains('/') {
        return Err(ConfigError::InvalidRepository(raw.to_string()));
    }
    Ok((owner.to_string(), repo.to_string()))
}

/// Extracts the pull request number from the workflow event payload
/// (`GITHUB_EVENT_PATH` JSON, top-level `number`).
pub fn pull_request_number_from_event(path: &Path) -> Result<u64, ConfigError> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| ConfigError::InvalidEventPayload(e.to_string()))?;
    let payload: serde_json::Value = serde_json::from_str(&raw)
        .map_err(|e| ConfigError::InvalidEventPayload(e.to_string()))?;

    payload
        .get("number")
        .and_then(|n| n.as_u64())
        .ok_or_else(|| {
            ConfigError::InvalidEventPayload("event payload has no pull request number".into())
        })
}

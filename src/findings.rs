//! Static-analysis findings: the input side of the pipeline.
//!
//! Findings arrive as a results JSON file (`{"results": [...]}`) produced by
//! the scanner. Filenames in the results are repository paths once the
//! workspace prefix is stripped; stripping is a boundary concern handled
//! here before the core ever compares filenames.

use std::path::Path;

use serde::Deserialize;

use crate::errors::FindingsError;

/// File and inclusive line range a finding points at.
#[derive(Debug, Clone, Deserialize)]
pub struct FindingLocation {
    pub filename: String,
    pub start_line: u64,
    pub end_line: u64,
}

/// One finding from the results file. Immutable once loaded.
#[derive(Debug, Clone, Deserialize)]
pub struct Finding {
    pub rule_id: String,
    #[serde(default)]
    pub rule_description: String,
    #[serde(default)]
    pub rule_provider: String,
    pub description: String,
    #[serde(default)]
    pub severity: String,
    /// Reference links for the rule. Loaders fold the legacy single `link`
    /// field into this list.
    #[serde(default)]
    pub links: Vec<String>,
    #[serde(default)]
    link: Option<String>,
    pub location: FindingLocation,
}

#[derive(Debug, Deserialize)]
struct ResultsFile {
    #[serde(default)]
    results: Vec<Finding>,
}

/// Loads findings from a results JSON file.
pub fn load_findings(path: &Path) -> Result<Vec<Finding>, FindingsError> {
    let raw = std::fs::read_to_string(path)?;
    let parsed: ResultsFile = serde_json::from_str(&raw)?;

    let mut findings = parsed.results;
    for finding in &mut findings {
        if let Some(link) = finding.link.take() {
            if !link.is_empty() && !finding.links.contains(&link) {
                finding.links.push(link);
            }
        }
    }
    Ok(findings)
}

/// Rewrites finding filenames from absolute workspace paths to repository
/// paths, e.g. `/github/workspace/main.tf` → `main.tf`.
pub fn strip_workspace_prefix(findings: &mut [Finding], workspace_root: &str) {
    if workspace_root.is_empty() {
        return;
    }
    let prefix = format!("{}/", workspace_root.trim_end_matches('/'));
    for finding in findings {
        if let Some(stripped) = finding.location.filename.strip_prefix(&prefix) {
            finding.location.filename = stripped.to_string();
        }
    }
}

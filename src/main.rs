//! GitHub Action entry point: read the environment, load the results file,
//! post findings as review comments, and reflect the outcome in the exit
//! status.

use std::path::PathBuf;
use std::process::ExitCode;

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use pr_commenter::config::{self, CommenterConfig};
use pr_commenter::errors::CommenterResult;
use pr_commenter::findings::{load_findings, strip_workspace_prefix};
use pr_commenter::github::{GitHubClient, PullRequestRef};
use pr_commenter::publish::{Commenter, RunSummary};

#[tokio::main]
async fn main() -> ExitCode {
    // Optional in CI; the action reads the real environment directly.
    dotenvy::dotenv().ok();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = match CommenterConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("the commenter failed to start: {e}");
            return ExitCode::FAILURE;
        }
    };

    match run(&config).await {
        Ok(summary) if summary.is_failure(config.fail_on_duplicate) => {
            for e in &summary.errors {
                error!("{e}");
            }
            ExitCode::FAILURE
        }
        Ok(summary) => {
            if !summary.did_work() {
                info!("no findings were relevant for this pull request");
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("the commenter failed with the following error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(config: &CommenterConfig) -> CommenterResult<RunSummary> {
    let repository = std::env::var("GITHUB_REPOSITORY").unwrap_or_default();
    let (owner, repo) = config::parse_repository(&repository)?;

    let event_path = std::env::var("GITHUB_EVENT_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/github/workflow/event.json"));
    let number = config::pull_request_number_from_event(&event_path)?;

    let pr = PullRequestRef {
        owner,
        repo,
        number,
    };
    info!("starting the commenter for {pr}");

    let results_path = std::env::var("INPUT_RESULTS_FILE")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("results.json"));
    let mut findings = load_findings(&results_path)?;
    if let Ok(workspace) = std::env::var("GITHUB_WORKSPACE") {
        strip_workspace_prefix(&mut findings, &workspace);
    }
    info!(
        "loaded {} findings from {}",
        findings.len(),
        results_path.display()
    );

    let client = GitHubClient::new(&config.base_api, &config.token)?;
    let mut commenter = Commenter::new(client, pr, config).await?;
    commenter.post_findings(&findings).await
}

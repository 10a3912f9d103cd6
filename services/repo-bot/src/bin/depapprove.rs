//! Dependency Bot Approval Tool
//!
//! Scans open pull requests and approves the ones opened by the dependency
//! bot that only touch `go.mod`/`go.sum`. Dry by default.
//!
//! ## Usage
//! ```bash
//! # Report what would be approved across the default repositories
//! GH_TOKEN=<PAT> depapprove
//!
//! # Apply the approvals
//! GH_TOKEN=<PAT> depapprove --dry-run false
//!
//! # Specific repositories, JSON summary
//! GH_TOKEN=<PAT> depapprove \
//!   --repo transparency-dev/merkle,transparency-dev/witness \
//!   --format json
//! ```

use anyhow::Result;
use clap::{ArgAction, Parser, ValueEnum};
use tracing::info;

use repo_bot::config::{
    self, DEFAULT_ALLOWED_FILENAMES, DEFAULT_API_URL, DEPENDABOT_ACCOUNT_ID, TOKEN_ENV,
};
use repo_bot::{logging, ApprovalPolicy, ApprovalRun, ApprovalSummary, GitHubClient, RepoRef};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

/// Dependency Bot Approval Tool
#[derive(Parser, Debug)]
#[command(name = "depapprove")]
#[command(about = "Auto-approve dependency bot PRs that only touch go.mod/go.sum")]
#[command(version)]
struct Args {
    /// Repositories to scan as owner/project (defaults to the built-in set)
    #[arg(long = "repo", env = "DEPAPPROVE_REPOS", value_delimiter = ',')]
    repos: Vec<RepoRef>,

    /// GitHub token (PAT)
    #[arg(long, env = TOKEN_ENV, hide_env_values = true)]
    token: Option<String>,

    /// Set to false to apply the approvals
    #[arg(long, env = "DRY_RUN", default_value_t = true, action = ArgAction::Set)]
    dry_run: bool,

    /// Account ID of the dependency bot
    #[arg(long, env = "DEPENDABOT_ACCOUNT_ID", default_value_t = DEPENDABOT_ACCOUNT_ID)]
    bot_id: u64,

    /// Filenames an approvable PR may touch (defaults to go.mod,go.sum)
    #[arg(long = "allow", value_delimiter = ',')]
    allowed: Vec<String>,

    /// Do not approve PRs that report no changed files
    #[arg(long)]
    reject_empty: bool,

    /// Review body sent with each approval
    #[arg(long)]
    message: Option<String>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// GitHub API base URL
    #[arg(long, env = "GITHUB_API_URL", default_value = DEFAULT_API_URL)]
    api_url: String,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    logging::init(args.verbose)?;

    let token = config::require_token(args.token)?;

    let repos = if args.repos.is_empty() {
        RepoRef::defaults()
    } else {
        args.repos
    };

    let policy = if args.allowed.is_empty() {
        ApprovalPolicy::new(args.bot_id, DEFAULT_ALLOWED_FILENAMES.iter().copied())
    } else {
        ApprovalPolicy::new(args.bot_id, args.allowed)
    }
    .reject_empty(args.reject_empty);

    info!(
        "🤖 {} dependency bot PRs in {} repositories...",
        if args.dry_run { "Checking" } else { "Approving" },
        repos.len()
    );

    let client = GitHubClient::new(args.api_url, Some(token))?;
    let summary = ApprovalRun::new(&client, &policy)
        .dry_run(args.dry_run)
        .message(args.message)
        .run(&repos)
        .await?;

    match args.format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        OutputFormat::Text => {
            for outcome in &summary.results {
                println!("{}", outcome);
            }
            println!("{}", summary_line(&summary));
        }
    }

    Ok(())
}

fn summary_line(summary: &ApprovalSummary) -> String {
    format!(
        "{} {} PR(s) considered, {} eligible, {} approved, {} failed{}",
        if summary.failed == 0 { "✅" } else { "⚠️" },
        summary.considered,
        summary.eligible,
        summary.approved,
        summary.failed,
        if summary.dry_run { " (dry run)" } else { "" }
    )
}

//! Work Item Listing Tool
//!
//! Prints the open issues and pull requests of one repository, one line each.
//!
//! ## Usage
//! ```bash
//! worklist --repo google/trillian
//!
//! # Authenticated, for private repositories or a higher rate limit
//! GH_TOKEN=<PAT> worklist --repo transparency-dev/witness
//! ```

use anyhow::Result;
use clap::{ArgAction, Parser};

use repo_bot::config::{DEFAULT_API_URL, TOKEN_ENV};
use repo_bot::{logging, GitHubClient, RepoRef, WorkReport};

/// Work Item Listing Tool
#[derive(Parser, Debug)]
#[command(name = "worklist")]
#[command(about = "List open issues and pull requests of a GitHub repository")]
#[command(version)]
struct Args {
    /// Repository as owner/project
    #[arg(long, default_value = "google/trillian")]
    repo: RepoRef,

    /// Optional GitHub token; requests are anonymous without one
    #[arg(long, env = TOKEN_ENV, hide_env_values = true)]
    token: Option<String>,

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

    let token = args.token.filter(|t| !t.trim().is_empty());
    let client = GitHubClient::new(args.api_url, token)?;

    let report = WorkReport::fetch(&client, &args.repo).await?;
    println!("{}", report.render());

    Ok(())
}

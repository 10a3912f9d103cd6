//! Configuration
//!
//! Repository references, built-in defaults and credential resolution.
//! Argument parsing itself lives in the binaries (clap derive + env).

use std::fmt;
use std::str::FromStr;

use crate::error::BotError;

/// Base URL of the public GitHub REST API
pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// Account ID of `dependabot[bot]`
pub const DEPENDABOT_ACCOUNT_ID: u64 = 49699333;

/// Files a dependency bump may touch and still be auto-approved
pub const DEFAULT_ALLOWED_FILENAMES: &[&str] = &["go.mod", "go.sum"];

/// Environment variable holding the API token
pub const TOKEN_ENV: &str = "GH_TOKEN";

/// Repositories scanned by `depapprove` when none are given
pub const DEFAULT_REPOS: &[&str] = &[
    "transparency-dev/armored-witness",
    "transparency-dev/armored-witness-applet",
    "transparency-dev/armored-witness-boot",
    "transparency-dev/armored-witness-common",
    "transparency-dev/armored-witness-os",
    "transparency-dev/distributor",
    "transparency-dev/formats",
    "transparency-dev/merkle",
    "transparency-dev/serverless-log",
    "transparency-dev/witness",
];

/// An `owner/project` pair identifying a repository
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepoRef {
    pub owner: String,
    pub project: String,
}

impl RepoRef {
    pub fn new(owner: impl Into<String>, project: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            project: project.into(),
        }
    }

    /// The built-in repository set, in scan order
    pub fn defaults() -> Vec<RepoRef> {
        DEFAULT_REPOS
            .iter()
            .filter_map(|r| r.parse().ok())
            .collect()
    }
}

impl FromStr for RepoRef {
    type Err = BotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split('/').collect::<Vec<_>>().as_slice() {
            [owner, project] if !owner.is_empty() && !project.is_empty() => {
                Ok(RepoRef::new(*owner, *project))
            }
            _ => Err(BotError::InvalidRepo(s.to_string())),
        }
    }
}

impl fmt::Display for RepoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.project)
    }
}

/// Resolve the API token, treating an empty value the same as a missing one
pub fn require_token(token: Option<String>) -> Result<String, BotError> {
    match token {
        Some(t) if !t.trim().is_empty() => Ok(t),
        _ => Err(BotError::MissingToken),
    }
}

//! Work Items
//!
//! Issues and pull requests rendered as one line each for a quick triage
//! overview of a repository.

use std::fmt::Write as _;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::config::RepoRef;
use crate::error::BotError;
use crate::github::{HostingApi, Issue, Label, PullRequest, User};

const DATE_FORMAT: &str = "%Y-%m-%d";
const DRAFT_LABEL: &str = "draft";

/// An issue or a pull request
#[derive(Debug, Clone)]
pub enum WorkItem {
    Issue(Issue),
    PullRequest(PullRequest),
}

impl WorkItem {
    pub fn number(&self) -> u64 {
        match self {
            WorkItem::Issue(i) => i.number,
            WorkItem::PullRequest(p) => p.number,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            WorkItem::Issue(i) => &i.title,
            WorkItem::PullRequest(p) => &p.title,
        }
    }

    pub fn author(&self) -> Option<&User> {
        match self {
            WorkItem::Issue(i) => i.user.as_ref(),
            WorkItem::PullRequest(p) => p.user.as_ref(),
        }
    }

    /// Logins expected to act next: the assignee, then requested reviewers
    pub fn attention_set(&self) -> Vec<String> {
        match self {
            WorkItem::Issue(i) => i.assignee.iter().map(|u| u.login.clone()).collect(),
            WorkItem::PullRequest(p) => p
                .assignee
                .iter()
                .chain(p.requested_reviewers.iter())
                .map(|u| u.login.clone())
                .collect(),
        }
    }

    /// Label names; draft pull requests also get `draft`
    pub fn labels(&self) -> Vec<String> {
        match self {
            WorkItem::Issue(i) => label_names(&i.labels),
            WorkItem::PullRequest(p) => {
                let mut labels = label_names(&p.labels);
                if p.draft {
                    labels.push(DRAFT_LABEL.to_string());
                }
                labels
            }
        }
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        match self {
            WorkItem::Issue(i) => i.created_at,
            WorkItem::PullRequest(p) => p.created_at,
        }
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        match self {
            WorkItem::Issue(i) => i.updated_at,
            WorkItem::PullRequest(p) => p.updated_at,
        }
    }

    /// `#<n> "<title>": <author> -> [attention] (<created>, <updated>) [labels]`
    pub fn format_line(&self) -> String {
        let author = self
            .author()
            .map(|u| u.login.as_str())
            .unwrap_or("<unknown>");

        format!(
            "#{} {:?}: {} -> {} ({}, {}) {}",
            self.number(),
            self.title(),
            author,
            json_list(&self.attention_set()),
            self.created_at().format(DATE_FORMAT),
            self.updated_at().format(DATE_FORMAT),
            json_list(&self.labels()),
        )
    }
}

impl From<Issue> for WorkItem {
    fn from(issue: Issue) -> Self {
        WorkItem::Issue(issue)
    }
}

impl From<PullRequest> for WorkItem {
    fn from(pr: PullRequest) -> Self {
        WorkItem::PullRequest(pr)
    }
}

fn label_names(labels: &[Label]) -> Vec<String> {
    labels.iter().map(|l| l.name.clone()).collect()
}

fn json_list(items: &[String]) -> String {
    serde_json::to_string(items).unwrap_or_else(|_| "[]".to_string())
}

/// Open issues and pull requests of one repository
#[derive(Debug, Default)]
pub struct WorkReport {
    pub issues: Vec<WorkItem>,
    pub pull_requests: Vec<WorkItem>,
}

impl WorkReport {
    /// Fetch both listings; the issue listing is stripped of pull requests
    pub async fn fetch(api: &dyn HostingApi, repo: &RepoRef) -> Result<Self, BotError> {
        let issues = api
            .list_issues(repo)
            .await
            .map_err(|source| BotError::ListIssues {
                repo: repo.to_string(),
                source,
            })?;

        let pull_requests = api
            .list_pull_requests(repo)
            .await
            .map_err(|source| BotError::ListPullRequests {
                repo: repo.to_string(),
                source,
            })?;

        debug!(
            repo = %repo,
            issues = issues.len(),
            pull_requests = pull_requests.len(),
            "Fetched work items"
        );

        Ok(Self {
            issues: issues
                .into_iter()
                .filter(|i| !i.is_pull_request())
                .map(WorkItem::from)
                .collect(),
            pull_requests: pull_requests.into_iter().map(WorkItem::from).collect(),
        })
    }

    pub fn render(&self) -> String {
        let mut out = String::new();

        let _ = writeln!(out, "{} issues:", self.issues.len());
        for item in &self.issues {
            let _ = writeln!(out, " {}", item.format_line());
        }

        let _ = writeln!(out, "{} PRs:", self.pull_requests.len());
        for item in &self.pull_requests {
            let _ = writeln!(out, " {}", item.format_line());
        }

        out
    }
}

//! GitHub REST Client
//!
//! Wire types for the handful of endpoints the tools use, the `HostingApi`
//! trait the approval scan and work listing are written against, and a
//! `reqwest` implementation of it.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::RepoRef;
use crate::error::ApiError;

const USER_AGENT: &str = "repo-bot";
const API_VERSION: &str = "2022-11-28";
const PER_PAGE: &str = "100";

// ============================================================
// API Types
// ============================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub login: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PullRequest {
    pub id: u64,
    pub number: u64,
    pub title: String,
    pub html_url: String,
    /// Absent when the author account has been deleted
    pub user: Option<User>,
    #[serde(default)]
    pub draft: bool,
    pub assignee: Option<User>,
    #[serde(default)]
    pub requested_reviewers: Vec<User>,
    #[serde(default)]
    pub labels: Vec<Label>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PullRequest {
    pub fn author_id(&self) -> Option<u64> {
        self.user.as_ref().map(|u| u.id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Issue {
    pub number: u64,
    pub title: String,
    pub html_url: String,
    pub user: Option<User>,
    pub assignee: Option<User>,
    #[serde(default)]
    pub labels: Vec<Label>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Present when the "issue" is really a pull request
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pull_request: Option<serde_json::Value>,
}

impl Issue {
    pub fn is_pull_request(&self) -> bool {
        self.pull_request.is_some()
    }
}

/// One entry of a PR's changed file list
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PullRequestFile {
    pub filename: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReviewEvent {
    Approve,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReviewRequest {
    pub event: ReviewEvent,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

impl ReviewRequest {
    pub fn approve(body: Option<String>) -> Self {
        Self {
            event: ReviewEvent::Approve,
            body,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Review {
    pub id: u64,
}

// ============================================================
// Hosting API Trait
// ============================================================

/// Operations the tools need from the repository host
#[async_trait]
pub trait HostingApi: Send + Sync {
    /// Open pull requests, first page only
    async fn list_pull_requests(&self, repo: &RepoRef) -> Result<Vec<PullRequest>, ApiError>;

    /// Changed files of one pull request
    async fn list_pull_request_files(
        &self,
        repo: &RepoRef,
        number: u64,
    ) -> Result<Vec<PullRequestFile>, ApiError>;

    /// Submit a review on a pull request
    async fn submit_review(
        &self,
        repo: &RepoRef,
        number: u64,
        review: &ReviewRequest,
    ) -> Result<Review, ApiError>;

    /// Open issues; GitHub includes pull requests in this listing
    async fn list_issues(&self, repo: &RepoRef) -> Result<Vec<Issue>, ApiError>;
}

// ============================================================
// Client Implementation
// ============================================================

/// GitHub REST API client
pub struct GitHubClient {
    http: Client,
    base_url: String,
    token: Option<String>,
}

impl GitHubClient {
    /// Create a client against `base_url`; requests are anonymous without a token
    pub fn new(base_url: impl Into<String>, token: Option<String>) -> Result<Self, ApiError> {
        let http = Client::builder().user_agent(USER_AGENT).build()?;
        let base_url = base_url.into().trim_end_matches('/').to_string();

        Ok(Self {
            http,
            base_url,
            token,
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        debug!(%method, %url, "GitHub request");

        let builder = self
            .http
            .request(method, url)
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", API_VERSION);

        match &self.token {
            Some(token) => builder.header("Authorization", format!("Bearer {}", token)),
            None => builder,
        }
    }

    async fn send<T: DeserializeOwned>(builder: RequestBuilder) -> Result<T, ApiError> {
        let response = builder.send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::from_response(status.as_u16(), body));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))
    }
}

#[async_trait]
impl HostingApi for GitHubClient {
    async fn list_pull_requests(&self, repo: &RepoRef) -> Result<Vec<PullRequest>, ApiError> {
        let path = format!("/repos/{}/{}/pulls", repo.owner, repo.project);
        let builder = self
            .request(Method::GET, &path)
            .query(&[("state", "open"), ("per_page", PER_PAGE)]);
        Self::send(builder).await
    }

    async fn list_pull_request_files(
        &self,
        repo: &RepoRef,
        number: u64,
    ) -> Result<Vec<PullRequestFile>, ApiError> {
        let path = format!("/repos/{}/{}/pulls/{}/files", repo.owner, repo.project, number);
        let builder = self
            .request(Method::GET, &path)
            .query(&[("per_page", PER_PAGE)]);
        Self::send(builder).await
    }

    async fn submit_review(
        &self,
        repo: &RepoRef,
        number: u64,
        review: &ReviewRequest,
    ) -> Result<Review, ApiError> {
        let path = format!(
            "/repos/{}/{}/pulls/{}/reviews",
            repo.owner, repo.project, number
        );
        let builder = self.request(Method::POST, &path).json(review);
        Self::send(builder).await
    }

    async fn list_issues(&self, repo: &RepoRef) -> Result<Vec<Issue>, ApiError> {
        let path = format!("/repos/{}/{}/issues", repo.owner, repo.project);
        let builder = self
            .request(Method::GET, &path)
            .query(&[("state", "open"), ("per_page", PER_PAGE)]);
        Self::send(builder).await
    }
}

//! Dependency Bot Approval Scan
//!
//! Walks the open pull requests of each configured repository, evaluates
//! them against an `ApprovalPolicy`, and approves the eligible ones unless
//! running dry. Listing failures abort the run; a rejected review is logged
//! and recorded on that PR's outcome.

use std::fmt;

use serde::Serialize;
use tracing::{debug, error, info, trace};

use crate::config::RepoRef;
use crate::error::BotError;
use crate::github::{HostingApi, PullRequest, ReviewRequest};
use crate::policy::{ApprovalPolicy, Classification};

/// What the scan did with a pull request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ReviewAction {
    /// Eligible, but the run is dry
    WouldApprove,
    /// Approval review submitted
    Approved { review_id: u64 },
    /// Eligible, but submitting the review failed
    ApprovalFailed { error: String },
    /// Bot authored, touches files outside the allow-set
    NeedsHumanReview,
    NotBotAuthored,
}

impl fmt::Display for ReviewAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReviewAction::WouldApprove => write!(f, "would-approve"),
            ReviewAction::Approved { review_id } => write!(f, "approved (review {})", review_id),
            ReviewAction::ApprovalFailed { error } => write!(f, "approval-failed: {}", error),
            ReviewAction::NeedsHumanReview => write!(f, "needs-human-review"),
            ReviewAction::NotBotAuthored => write!(f, "not-bot-authored"),
        }
    }
}

/// Result of considering one pull request
#[derive(Debug, Clone, Serialize)]
pub struct ApprovalOutcome {
    pub repository: String,
    pub pr_number: u64,
    pub title: String,
    pub html_url: String,
    pub is_bot_author: bool,
    pub eligible: bool,
    pub action: ReviewAction,
}

impl fmt::Display for ApprovalOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}#{} {:?} {} bot={} eligible={} {}",
            self.repository,
            self.pr_number,
            self.title,
            self.html_url,
            self.is_bot_author,
            self.eligible,
            self.action
        )
    }
}

/// Totals and per-PR outcomes for a whole run
#[derive(Debug, Serialize)]
pub struct ApprovalSummary {
    pub dry_run: bool,
    pub considered: usize,
    pub eligible: usize,
    pub approved: usize,
    pub failed: usize,
    pub results: Vec<ApprovalOutcome>,
}

impl ApprovalSummary {
    pub fn from_outcomes(dry_run: bool, results: Vec<ApprovalOutcome>) -> Self {
        let eligible = results.iter().filter(|r| r.eligible).count();
        let approved = results
            .iter()
            .filter(|r| matches!(r.action, ReviewAction::Approved { .. }))
            .count();
        let failed = results
            .iter()
            .filter(|r| matches!(r.action, ReviewAction::ApprovalFailed { .. }))
            .count();

        Self {
            dry_run,
            considered: results.len(),
            eligible,
            approved,
            failed,
            results,
        }
    }

    pub fn eligible_outcomes(&self) -> impl Iterator<Item = &ApprovalOutcome> {
        self.results.iter().filter(|r| r.eligible)
    }
}

/// A configured approval pass over a set of repositories
pub struct ApprovalRun<'a> {
    api: &'a dyn HostingApi,
    policy: &'a ApprovalPolicy,
    dry_run: bool,
    message: Option<String>,
}

impl<'a> ApprovalRun<'a> {
    /// Dry by default; call `dry_run(false)` to submit reviews
    pub fn new(api: &'a dyn HostingApi, policy: &'a ApprovalPolicy) -> Self {
        Self {
            api,
            policy,
            dry_run: true,
            message: None,
        }
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Body attached to submitted approval reviews
    pub fn message(mut self, message: Option<String>) -> Self {
        self.message = message;
        self
    }

    /// Scan every repository in order
    pub async fn run(&self, repos: &[RepoRef]) -> Result<ApprovalSummary, BotError> {
        info!(
            repos = repos.len(),
            dry_run = self.dry_run,
            bot_id = self.policy.bot_account_id,
            "Starting approval scan"
        );

        let mut results = Vec::new();
        for repo in repos {
            self.scan_repo(repo, &mut results).await?;
        }

        Ok(ApprovalSummary::from_outcomes(self.dry_run, results))
    }

    async fn scan_repo(
        &self,
        repo: &RepoRef,
        results: &mut Vec<ApprovalOutcome>,
    ) -> Result<(), BotError> {
        let prs = self
            .api
            .list_pull_requests(repo)
            .await
            .map_err(|source| BotError::ListPullRequests {
                repo: repo.to_string(),
                source,
            })?;

        debug!(repo = %repo, count = prs.len(), "Listed pull requests");

        for pr in &prs {
            results.push(self.process_pull_request(repo, pr).await?);
        }

        Ok(())
    }

    async fn process_pull_request(
        &self,
        repo: &RepoRef,
        pr: &PullRequest,
    ) -> Result<ApprovalOutcome, BotError> {
        let files = self
            .api
            .list_pull_request_files(repo, pr.number)
            .await
            .map_err(|source| BotError::ListFiles {
                repo: repo.to_string(),
                number: pr.number,
                source,
            })?;

        for file in &files {
            trace!("{}: {}", pr.html_url, file.filename);
        }

        let evaluation = self
            .policy
            .evaluate(pr.author_id(), files.iter().map(|f| f.filename.as_str()));

        debug!(
            "dependabot={}: approve: {}, {} {} {}",
            evaluation.is_bot_author, evaluation.eligible, pr.id, pr.title, pr.html_url
        );

        let action = match evaluation.classification() {
            Classification::Eligible => {
                info!("Approval can be granted for: {}", pr.html_url);
                if self.dry_run {
                    ReviewAction::WouldApprove
                } else {
                    self.approve(repo, pr).await
                }
            }
            Classification::NeedsHumanReview => {
                info!("Dependency bot PR requiring human review: {}", pr.html_url);
                ReviewAction::NeedsHumanReview
            }
            Classification::NotBotAuthored => ReviewAction::NotBotAuthored,
        };

        Ok(ApprovalOutcome {
            repository: repo.to_string(),
            pr_number: pr.number,
            title: pr.title.clone(),
            html_url: pr.html_url.clone(),
            is_bot_author: evaluation.is_bot_author,
            eligible: evaluation.eligible,
            action,
        })
    }

    async fn approve(&self, repo: &RepoRef, pr: &PullRequest) -> ReviewAction {
        let request = ReviewRequest::approve(self.message.clone());

        match self.api.submit_review(repo, pr.number, &request).await {
            Ok(review) => {
                info!(review_id = review.id, "Approved {}", pr.html_url);
                ReviewAction::Approved {
                    review_id: review.id,
                }
            }
            Err(e) => {
                error!("Error approving {}: {}", pr.html_url, e);
                ReviewAction::ApprovalFailed {
                    error: e.to_string(),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiError;
    use crate::github::{Issue, PullRequestFile, Review, User};
    use async_trait::async_trait;
    use chrono::{DateTime, Utc};
    use std::collections::{HashMap, HashSet};
    use std::sync::Mutex;

    const BOT: u64 = 42;
    const HUMAN: u64 = 7;

    fn timestamp() -> DateTime<Utc> {
        "2023-09-01T12:00:00Z".parse().unwrap()
    }

    fn pr(number: u64, author: Option<u64>) -> PullRequest {
        PullRequest {
            id: number * 1000,
            number,
            title: format!("PR {}", number),
            html_url: format!("https://github.com/o/p/pull/{}", number),
            user: author.map(|id| User {
                id,
                login: format!("user-{}", id),
            }),
            draft: false,
            assignee: None,
            requested_reviewers: Vec::new(),
            labels: Vec::new(),
            created_at: timestamp(),
            updated_at: timestamp(),
        }
    }

    #[derive(Default)]
    struct FakeApi {
        prs: HashMap<String, Vec<PullRequest>>,
        files: HashMap<u64, Vec<&'static str>>,
        failing_repos: HashSet<String>,
        failing_files: HashSet<u64>,
        failing_reviews: HashSet<u64>,
        submitted: Mutex<Vec<(String, u64)>>,
    }

    impl FakeApi {
        fn with_prs(mut self, repo: &str, prs: Vec<PullRequest>) -> Self {
            self.prs.insert(repo.to_string(), prs);
            self
        }

        fn with_files(mut self, number: u64, files: Vec<&'static str>) -> Self {
            self.files.insert(number, files);
            self
        }

        fn submitted(&self) -> Vec<(String, u64)> {
            self.submitted.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl HostingApi for FakeApi {
        async fn list_pull_requests(&self, repo: &RepoRef) -> Result<Vec<PullRequest>, ApiError> {
            let key = repo.to_string();
            if self.failing_repos.contains(&key) {
                return Err(ApiError::Status {
                    status: 500,
                    body: "boom".to_string(),
                });
            }
            Ok(self.prs.get(&key).cloned().unwrap_or_default())
        }

        async fn list_pull_request_files(
            &self,
            _repo: &RepoRef,
            number: u64,
        ) -> Result<Vec<PullRequestFile>, ApiError> {
            if self.failing_files.contains(&number) {
                return Err(ApiError::Status {
                    status: 502,
                    body: "bad gateway".to_string(),
                });
            }
            Ok(self
                .files
                .get(&number)
                .map(|fs| {
                    fs.iter()
                        .map(|f| PullRequestFile {
                            filename: f.to_string(),
                        })
                        .collect()
                })
                .unwrap_or_default())
        }

        async fn submit_review(
            &self,
            repo: &RepoRef,
            number: u64,
            _review: &ReviewRequest,
        ) -> Result<Review, ApiError> {
            if self.failing_reviews.contains(&number) {
                return Err(ApiError::SelfApproval);
            }
            self.submitted
                .lock()
                .unwrap()
                .push((repo.to_string(), number));
            Ok(Review { id: 9000 + number })
        }

        async fn list_issues(&self, _repo: &RepoRef) -> Result<Vec<Issue>, ApiError> {
            Ok(Vec::new())
        }
    }

    fn policy() -> ApprovalPolicy {
        ApprovalPolicy::new(BOT, ["go.mod", "go.sum"])
    }

    fn repo() -> RepoRef {
        RepoRef::new("o", "p")
    }

    #[tokio::test]
    async fn test_only_bot_pr_is_eligible() {
        let api = FakeApi::default()
            .with_prs("o/p", vec![pr(1, Some(BOT)), pr(2, Some(HUMAN))])
            .with_files(1, vec!["go.mod"])
            .with_files(2, vec!["go.mod"]);
        let policy = policy();

        let summary = ApprovalRun::new(&api, &policy)
            .run(&[repo()])
            .await
            .unwrap();

        let eligible: Vec<u64> = summary.eligible_outcomes().map(|o| o.pr_number).collect();
        assert_eq!(eligible, vec![1]);
        assert_eq!(summary.considered, 2);
        assert_eq!(summary.results[0].action, ReviewAction::WouldApprove);
        assert_eq!(summary.results[1].action, ReviewAction::NotBotAuthored);
        assert!(api.submitted().is_empty());
    }

    #[tokio::test]
    async fn test_live_run_submits_approvals() {
        let api = FakeApi::default()
            .with_prs(
                "o/p",
                vec![pr(1, Some(BOT)), pr(2, Some(BOT)), pr(3, None)],
            )
            .with_files(1, vec!["go.mod", "go.sum"])
            .with_files(2, vec!["go.mod", "main.go"])
            .with_files(3, vec!["go.sum"]);
        let policy = policy();

        let summary = ApprovalRun::new(&api, &policy)
            .dry_run(false)
            .run(&[repo()])
            .await
            .unwrap();

        assert_eq!(api.submitted(), vec![("o/p".to_string(), 1)]);
        assert_eq!(
            summary.results[0].action,
            ReviewAction::Approved { review_id: 9001 }
        );
        assert_eq!(summary.results[1].action, ReviewAction::NeedsHumanReview);
        assert_eq!(summary.results[2].action, ReviewAction::NotBotAuthored);
        assert_eq!(summary.approved, 1);
        assert_eq!(summary.failed, 0);
        assert!(!summary.dry_run);
    }

    #[tokio::test]
    async fn test_submission_failure_does_not_stop_run() {
        let mut api = FakeApi::default()
            .with_prs("o/p", vec![pr(1, Some(BOT)), pr(2, Some(BOT))])
            .with_files(1, vec!["go.sum"])
            .with_files(2, vec!["go.sum"]);
        api.failing_reviews.insert(1);
        let policy = policy();

        let summary = ApprovalRun::new(&api, &policy)
            .dry_run(false)
            .run(&[repo()])
            .await
            .unwrap();

        assert_eq!(
            summary.results[0].action,
            ReviewAction::ApprovalFailed {
                error: "Self-approval restriction".to_string()
            }
        );
        assert_eq!(api.submitted(), vec![("o/p".to_string(), 2)]);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.approved, 1);
    }

    #[tokio::test]
    async fn test_listing_failure_is_fatal() {
        let mut api = FakeApi::default()
            .with_prs("o/p", vec![pr(1, Some(BOT))])
            .with_files(1, vec!["go.mod"]);
        api.failing_repos.insert("o/broken".to_string());
        let policy = policy();

        let err = ApprovalRun::new(&api, &policy)
            .dry_run(false)
            .run(&[repo(), RepoRef::new("o", "broken")])
            .await
            .unwrap_err();

        assert!(matches!(err, BotError::ListPullRequests { ref repo, .. } if repo == "o/broken"));
    }

    #[tokio::test]
    async fn test_file_listing_failure_is_fatal() {
        let mut api = FakeApi::default().with_prs("o/p", vec![pr(1, Some(HUMAN))]);
        api.failing_files.insert(1);
        let policy = policy();

        let err = ApprovalRun::new(&api, &policy)
            .run(&[repo()])
            .await
            .unwrap_err();

        assert!(matches!(err, BotError::ListFiles { number: 1, .. }));
    }

    #[tokio::test]
    async fn test_message_reaches_review() {
        struct CapturingApi(Mutex<Option<ReviewRequest>>);

        #[async_trait]
        impl HostingApi for CapturingApi {
            async fn list_pull_requests(
                &self,
                _repo: &RepoRef,
            ) -> Result<Vec<PullRequest>, ApiError> {
                Ok(vec![pr(5, Some(BOT))])
            }
            async fn list_pull_request_files(
                &self,
                _repo: &RepoRef,
                _number: u64,
            ) -> Result<Vec<PullRequestFile>, ApiError> {
                Ok(Vec::new())
            }
            async fn submit_review(
                &self,
                _repo: &RepoRef,
                _number: u64,
                review: &ReviewRequest,
            ) -> Result<Review, ApiError> {
                *self.0.lock().unwrap() = Some(review.clone());
                Ok(Review { id: 1 })
            }
            async fn list_issues(&self, _repo: &RepoRef) -> Result<Vec<Issue>, ApiError> {
                Ok(Vec::new())
            }
        }

        let api = CapturingApi(Mutex::new(None));
        let policy = policy();
        ApprovalRun::new(&api, &policy)
            .dry_run(false)
            .message(Some("Dependency bump".to_string()))
            .run(&[repo()])
            .await
            .unwrap();

        let sent = api.0.lock().unwrap().clone().unwrap();
        assert_eq!(sent.body.as_deref(), Some("Dependency bump"));
    }

    #[test]
    fn test_outcome_line() {
        let outcome = ApprovalOutcome {
            repository: "transparency-dev/merkle".to_string(),
            pr_number: 12,
            title: "Bump golang.org/x/mod from 0.11.0 to 0.12.0".to_string(),
            html_url: "https://github.com/transparency-dev/merkle/pull/12".to_string(),
            is_bot_author: true,
            eligible: true,
            action: ReviewAction::WouldApprove,
        };
        assert_eq!(
            outcome.to_string(),
            "transparency-dev/merkle#12 \"Bump golang.org/x/mod from 0.11.0 to 0.12.0\" \
             https://github.com/transparency-dev/merkle/pull/12 bot=true eligible=true would-approve"
        );
    }

    #[test]
    fn test_summary_json_shape() {
        let summary = ApprovalSummary::from_outcomes(
            true,
            vec![ApprovalOutcome {
                repository: "o/p".to_string(),
                pr_number: 1,
                title: "t".to_string(),
                html_url: "u".to_string(),
                is_bot_author: true,
                eligible: false,
                action: ReviewAction::NeedsHumanReview,
            }],
        );
        let value = serde_json::to_value(&summary).unwrap();
        assert_eq!(value["considered"], 1);
        assert_eq!(value["eligible"], 0);
        assert_eq!(value["results"][0]["action"]["status"], "needs_human_review");
    }
}

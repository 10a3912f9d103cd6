//! Repository Bot Tools
//!
//! Small utilities over the GitHub REST API.
//!
//! ## Binaries
//!
//! - `depapprove`: approve dependency bot PRs that only touch `go.mod`/`go.sum`
//! - `worklist`: print the open issues and pull requests of a repository
//!
//! ## Example
//!
//! ```bash
//! # See what would be approved across the default repositories
//! GH_TOKEN=<PAT> depapprove
//!
//! # Approve for real, in two specific repositories
//! GH_TOKEN=<PAT> depapprove --dry-run false \
//!   --repo transparency-dev/merkle --repo transparency-dev/witness
//!
//! # Triage overview
//! worklist --repo google/trillian
//! ```

pub mod approval;
pub mod config;
pub mod error;
pub mod github;
pub mod logging;
pub mod policy;
pub mod workitem;

pub use approval::{ApprovalOutcome, ApprovalRun, ApprovalSummary, ReviewAction};
pub use config::RepoRef;
pub use error::{ApiError, BotError};
pub use github::{GitHubClient, HostingApi};
pub use policy::{ApprovalPolicy, Classification, Evaluation};
pub use workitem::{WorkItem, WorkReport};

//! Error Types
//!
//! `ApiError` covers a single call to the hosting API. `BotError` is what the
//! binaries see: configuration problems and listing failures, all fatal.
//! Review submission failures stay as `ApiError` and are recorded per PR.

use thiserror::Error;

/// Marker GitHub puts in the body when a token tries to approve its own PR
const SELF_APPROVAL_MARKER: &str = "Can not approve your own pull request";

/// Errors returned by a single hosting API call
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never produced a response
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The API answered with a non-success status
    #[error("GitHub API error ({status}): {body}")]
    Status { status: u16, body: String },

    /// The token owner authored the PR and GitHub refused the review
    #[error("Self-approval restriction")]
    SelfApproval,

    /// The response body did not match the expected shape
    #[error("Failed to parse response: {0}")]
    Decode(String),
}

impl ApiError {
    /// Classify a non-success response from its status and body
    pub fn from_response(status: u16, body: String) -> Self {
        if body.contains(SELF_APPROVAL_MARKER) {
            ApiError::SelfApproval
        } else {
            ApiError::Status { status, body }
        }
    }
}

/// Fatal errors for a run of either tool
#[derive(Debug, Error)]
pub enum BotError {
    /// No credential in the environment
    #[error(
        "GH_TOKEN is not set: create a PAT (https://github.com/settings/tokens) and export it as GH_TOKEN"
    )]
    MissingToken,

    /// A repository argument that is not `owner/project`
    #[error("Invalid repository format: {0}. Expected: owner/project")]
    InvalidRepo(String),

    #[error("Failed to list pull requests for {repo}: {source}")]
    ListPullRequests {
        repo: String,
        #[source]
        source: ApiError,
    },

    #[error("Failed to list files for {repo}#{number}: {source}")]
    ListFiles {
        repo: String,
        number: u64,
        #[source]
        source: ApiError,
    },

    #[error("Failed to list issues for {repo}: {source}")]
    ListIssues {
        repo: String,
        #[source]
        source: ApiError,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_self_approval_detected_from_body() {
        let err = ApiError::from_response(
            422,
            r#"{"message":"Unprocessable Entity","errors":["Can not approve your own pull request"]}"#
                .to_string(),
        );
        assert!(matches!(err, ApiError::SelfApproval));
    }

    #[test]
    fn test_other_status_kept() {
        let err = ApiError::from_response(404, "Not Found".to_string());
        assert_eq!(err.to_string(), "GitHub API error (404): Not Found");
    }

    #[test]
    fn test_listing_error_names_repo() {
        let err = BotError::ListFiles {
            repo: "transparency-dev/merkle".to_string(),
            number: 7,
            source: ApiError::Status {
                status: 500,
                body: "boom".to_string(),
            },
        };
        assert_eq!(
            err.to_string(),
            "Failed to list files for transparency-dev/merkle#7: GitHub API error (500): boom"
        );
    }
}

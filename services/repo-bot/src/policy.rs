//! Approval Policy
//!
//! Decides whether a pull request may be approved without a human looking at
//! it: the author must be the dependency bot and every changed file must be
//! one of a small set of manifest/lockfile names.

use std::collections::BTreeSet;
use std::fmt;

use serde::Serialize;

use crate::config::{DEFAULT_ALLOWED_FILENAMES, DEPENDABOT_ACCOUNT_ID};

/// Auto-approval rules for dependency bot PRs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApprovalPolicy {
    /// Account ID of the bot whose PRs may be auto-approved
    pub bot_account_id: u64,
    /// Basenames a PR may touch and still qualify
    pub allowed_filenames: BTreeSet<String>,
    /// Refuse PRs that report no changed files at all
    pub reject_empty: bool,
}

impl Default for ApprovalPolicy {
    fn default() -> Self {
        Self::new(DEPENDABOT_ACCOUNT_ID, DEFAULT_ALLOWED_FILENAMES.iter().copied())
    }
}

impl ApprovalPolicy {
    pub fn new<I, S>(bot_account_id: u64, allowed_filenames: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            bot_account_id,
            allowed_filenames: allowed_filenames.into_iter().map(Into::into).collect(),
            reject_empty: false,
        }
    }

    /// Builder: treat a PR with no changed files as not eligible
    pub fn reject_empty(mut self, reject: bool) -> Self {
        self.reject_empty = reject;
        self
    }

    /// Exact, case-sensitive match on the part after the last `/`.
    pub fn is_allowed_path(&self, path: &str) -> bool {
        let basename = path.rsplit('/').next().unwrap_or(path);
        self.allowed_filenames.contains(basename)
    }

    /// Evaluate a PR from its author's account ID and its changed paths.
    ///
    /// A missing author is never the bot. The scan stops at the first path
    /// outside the allow-set; order does not change the verdict.
    pub fn evaluate<I, S>(&self, author_id: Option<u64>, changed_paths: I) -> Evaluation
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let is_bot_author = author_id == Some(self.bot_account_id);
        if !is_bot_author {
            return Evaluation {
                is_bot_author,
                eligible: false,
            };
        }

        let mut seen_any = false;
        let mut eligible = true;
        for path in changed_paths {
            seen_any = true;
            if !self.is_allowed_path(path.as_ref()) {
                eligible = false;
                break;
            }
        }

        if !seen_any && self.reject_empty {
            eligible = false;
        }

        Evaluation {
            is_bot_author,
            eligible,
        }
    }
}

/// Verdict for a single pull request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Evaluation {
    pub is_bot_author: bool,
    pub eligible: bool,
}

impl Evaluation {
    pub fn classification(&self) -> Classification {
        match (self.is_bot_author, self.eligible) {
            (true, true) => Classification::Eligible,
            (true, false) => Classification::NeedsHumanReview,
            (false, _) => Classification::NotBotAuthored,
        }
    }
}

/// Reporting label derived from an `Evaluation`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    Eligible,
    NeedsHumanReview,
    NotBotAuthored,
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Classification::Eligible => write!(f, "eligible"),
            Classification::NeedsHumanReview => write!(f, "needs-human-review"),
            Classification::NotBotAuthored => write!(f, "not-bot-authored"),
        }
    }
}

//! Core type definitions shared by the grading pipeline

use serde::Serialize;

/// A discovered assignment repository.
///
/// Repositories are named `{assignment}-{github username}`; the owner handle is
/// everything after the first hyphen, lowercased.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryRecord {
    /// Repository name as returned by the hosting platform
    pub name: String,
    /// Lowercase student handle derived from the name
    pub owner_handle: String,
}

impl RepositoryRecord {
    /// Build a record, deriving the owner handle from the name
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let owner_handle = owner_handle(&name);
        Self { name, owner_handle }
    }
}

/// Strip the first hyphen-delimited token and lowercase the remainder.
///
/// `"hw1-jane-doe"` -> `"jane-doe"`. A name without a hyphen has no handle.
#[inline]
pub fn owner_handle(repo_name: &str) -> String {
    repo_name
        .split_once('-')
        .map(|(_, rest)| rest.to_lowercase())
        .unwrap_or_default()
}

/// Terminal status of a workflow run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkflowConclusion {
    /// Run succeeded
    Success,
    /// Run failed
    Failure,
    /// Any other conclusion, kept verbatim (cancelled, neutral, timed_out, ...)
    Other(String),
}

impl WorkflowConclusion {
    /// Parse a conclusion string. Case-sensitive, as GitHub reports them.
    pub fn parse(s: &str) -> Self {
        match s {
            "success" => Self::Success,
            "failure" => Self::Failure,
            other => Self::Other(other.to_string()),
        }
    }

    /// Get string representation
    pub fn as_str(&self) -> &str {
        match self {
            Self::Success => "success",
            Self::Failure => "failure",
            Self::Other(s) => s,
        }
    }
}

/// A workflow run as reported by the hosting platform
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowRun {
    /// Run ID (used for re-runs)
    pub id: u64,
    /// Display name of the workflow
    pub name: String,
    /// Conclusion; `None` while the run is queued or in progress
    pub conclusion: Option<String>,
    /// RFC 3339 timestamp of the head commit that triggered the run
    pub head_commit_timestamp: Option<String>,
}

/// One page of workflow runs
#[derive(Debug, Clone, Default)]
pub struct WorkflowRunPage {
    /// Total number of runs for the repository, across all pages
    pub total_count: u64,
    /// Runs on this page, newest first
    pub runs: Vec<WorkflowRun>,
}

/// Why a repository has no gradeable run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AbsenceReason {
    /// The repository has never run a workflow
    NoRuns,
    /// Runs exist but none has a matching display name
    NoMatchingRun,
    /// The latest matching run has not concluded yet
    Incomplete,
}

impl AbsenceReason {
    /// Get string representation
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::NoRuns => "no workflow runs",
            Self::NoMatchingRun => "no run matches the workflow name",
            Self::Incomplete => "latest matching run has not concluded",
        }
    }
}

/// Most recent matching workflow run of one repository
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkflowOutcome {
    /// Nothing to grade
    Absent(AbsenceReason),
    /// A concluded run
    Completed {
        /// Run ID
        run_id: u64,
        /// Display name of the run
        run_name: String,
        /// Commit timestamp of the triggering commit, RFC 3339
        commit_timestamp: Option<String>,
        /// Run conclusion
        conclusion: WorkflowConclusion,
    },
}

impl WorkflowOutcome {
    /// True when the repository must be skipped
    #[inline]
    pub const fn is_absent(&self) -> bool {
        matches!(self, Self::Absent(_))
    }
}

/// Gradebook course
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Course {
    /// Course ID
    pub id: u64,
    /// Course name
    pub name: String,
}

/// Gradebook assignment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    /// Assignment ID
    pub id: u64,
    /// Assignment name
    pub name: String,
}

/// Gradebook user resolved from an institutional login
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GradebookUser {
    /// Gradebook user ID
    pub id: u64,
    /// Display name, if the API returned one
    pub name: Option<String>,
}

/// A user's submission for an assignment
#[derive(Debug, Clone, PartialEq)]
pub struct Submission {
    /// Gradebook user ID
    pub user_id: u64,
    /// Currently posted grade, as the gradebook formats it
    pub grade: Option<String>,
}

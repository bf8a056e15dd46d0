//! Per-repository results of a grading run

use serde::Serialize;
use std::fmt;

/// What happened to one repository
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RepositoryStatus {
    /// A score was posted
    Graded {
        /// Gradebook user ID
        user_id: u64,
        /// Posted score
        score: f64,
    },
    /// Nothing was posted: no run, no identity, no gradebook user
    Skipped {
        /// Human-readable reason
        reason: String,
    },
    /// An unexpected error stopped this repository
    Failed {
        /// Error message
        error: String,
    },
}

/// Result for one repository
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RepositoryReport {
    /// Repository name
    pub repository: String,
    /// Outcome
    #[serde(flatten)]
    pub status: RepositoryStatus,
}

/// Outcome counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    /// Repositories with a posted score
    pub graded: usize,
    /// Repositories skipped
    pub skipped: usize,
    /// Repositories that errored
    pub failed: usize,
}

/// Results of grading one assignment
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchReport {
    /// Assignment name
    pub assignment: String,
    /// Matching repositories, in discovery order
    pub repositories: Vec<String>,
    /// One entry per repository, in processing order
    pub results: Vec<RepositoryReport>,
    /// Outcome counts
    pub summary: BatchSummary,
}

impl BatchReport {
    /// Empty report for an assignment
    pub fn new(assignment: impl Into<String>, repositories: Vec<String>) -> Self {
        Self {
            assignment: assignment.into(),
            repositories,
            ..Default::default()
        }
    }

    /// Add a repository result
    pub fn record(&mut self, repository: impl Into<String>, status: RepositoryStatus) {
        match status {
            RepositoryStatus::Graded { .. } => self.summary.graded += 1,
            RepositoryStatus::Skipped { .. } => self.summary.skipped += 1,
            RepositoryStatus::Failed { .. } => self.summary.failed += 1,
        }
        self.results.push(RepositoryReport {
            repository: repository.into(),
            status,
        });
    }

    /// Result for a repository, if it was processed
    pub fn get(&self, repository: &str) -> Option<&RepositoryStatus> {
        self.results
            .iter()
            .find(|r| r.repository == repository)
            .map(|r| &r.status)
    }

    /// True when no repository failed
    pub fn is_clean(&self) -> bool {
        self.summary.failed == 0
    }
}

impl fmt::Display for BatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Grading: {}", self.assignment)?;
        writeln!(f, "Found repos:")?;
        for repo in &self.repositories {
            writeln!(f, "    {}", repo)?;
        }
        writeln!(f)?;
        for entry in &self.results {
            match &entry.status {
                RepositoryStatus::Graded { user_id, score } => {
                    writeln!(f, "{}: graded {} (user {})", entry.repository, score, user_id)?
                }
                RepositoryStatus::Skipped { reason } => {
                    writeln!(f, "{}: skipped ({})", entry.repository, reason)?
                }
                RepositoryStatus::Failed { error } => {
                    writeln!(f, "{}: failed ({})", entry.repository, error)?
                }
            }
        }
        write!(
            f,
            "{} graded, {} skipped, {} failed",
            self.summary.graded, self.summary.skipped, self.summary.failed
        )
    }
}

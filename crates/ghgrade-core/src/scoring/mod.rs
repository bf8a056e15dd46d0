//! Scoring: workflow conclusion and commit time to a numeric grade

pub mod delta;
pub mod late;

pub use delta::RelativeDelta;
pub use late::{parse_timezone, Comparator, DueDateConfig, LatePolicy};

use crate::error::{Error, Result};
use crate::types::{WorkflowConclusion, WorkflowOutcome};

/// Score for a passing run before any multiplier
pub const FULL_SCORE: f64 = 1.0;

/// Score for a failing run
pub const ZERO_SCORE: f64 = 0.0;

/// Converts workflow outcomes into scores
#[derive(Debug, Clone, Default)]
pub struct ScoringEngine {
    policy: Option<LatePolicy>,
}

impl ScoringEngine {
    /// Engine with an optional late policy
    pub fn new(policy: Option<LatePolicy>) -> Self {
        Self { policy }
    }

    /// The late policy, if any
    pub fn policy(&self) -> Option<&LatePolicy> {
        self.policy.as_ref()
    }

    /// Multiplier for a commit; 1.0 without a late policy
    pub fn multiplier(&self, commit_timestamp: Option<&str>) -> Result<f64> {
        match (&self.policy, commit_timestamp) {
            (None, _) => Ok(1.0),
            (Some(policy), Some(ts)) => policy.multiplier(ts),
            (Some(_), None) => Err(Error::Format(
                "Run has no head commit timestamp to compare with the due date".to_string(),
            )),
        }
    }

    /// Score a concluded run.
    ///
    /// `failure` is always 0 regardless of lateness. Conclusions other than
    /// `success` and `failure` score 0 and are logged.
    pub fn score(&self, conclusion: &WorkflowConclusion, commit_timestamp: Option<&str>) -> Result<f64> {
        match conclusion {
            WorkflowConclusion::Success => Ok(FULL_SCORE * self.multiplier(commit_timestamp)?),
            WorkflowConclusion::Failure => Ok(ZERO_SCORE),
            WorkflowConclusion::Other(value) => {
                tracing::warn!(conclusion = %value, "unrecognized workflow conclusion, scoring 0");
                Ok(ZERO_SCORE)
            }
        }
    }

    /// Score an outcome. `None` means the repository must be skipped.
    pub fn score_outcome(&self, outcome: &WorkflowOutcome) -> Result<Option<f64>> {
        match outcome {
            WorkflowOutcome::Absent(_) => Ok(None),
            WorkflowOutcome::Completed {
                commit_timestamp,
                conclusion,
                ..
            } => self.score(conclusion, commit_timestamp.as_deref()).map(Some),
        }
    }
}

//! Grading orchestration
//!
//! One run grades one assignment: the course and assignment are resolved
//! once, the identity map is loaded once, then every matching repository is
//! read, scored and submitted in turn. A repository's error is recorded in
//! the report and never stops the batch.

use crate::config::GraderConfig;
use crate::coordination::discovery::RepositoryDiscoverer;
use crate::coordination::report::{BatchReport, RepositoryStatus};
use crate::coordination::submitter::{resolve_assignment, GradeSubmitter};
use crate::coordination::workflow_reader::WorkflowReader;
use crate::error::Result;
use crate::identity::{IdentityMapLoader, RemoteIdentitySource};
use crate::scoring::ScoringEngine;
use crate::traits::{Gradebook, HostingPlatform, SpreadsheetService};
use crate::types::{RepositoryRecord, WorkflowOutcome};

/// Grades every repository of an assignment
pub struct Grader<'a, H, G, S> {
    config: &'a GraderConfig,
    hosting: &'a H,
    gradebook: &'a G,
    sheets: &'a S,
    scoring: ScoringEngine,
}

impl<'a, H, G, S> Grader<'a, H, G, S>
where
    H: HostingPlatform,
    G: Gradebook,
    S: SpreadsheetService,
{
    /// Create a grader without a late policy
    pub fn new(config: &'a GraderConfig, hosting: &'a H, gradebook: &'a G, sheets: &'a S) -> Self {
        Self {
            config,
            hosting,
            gradebook,
            sheets,
            scoring: ScoringEngine::default(),
        }
    }

    /// Replace the scoring engine
    pub fn with_scoring(mut self, scoring: ScoringEngine) -> Self {
        self.scoring = scoring;
        self
    }

    /// Grade `assignment`.
    ///
    /// Fails only when the course cannot be fetched or the repositories
    /// cannot be listed.
    pub async fn run(&self, assignment: &str) -> Result<BatchReport> {
        let course_id = self.config.canvas_course_id()?;
        let course = self.gradebook.get_course(course_id).await?;
        tracing::debug!(course_id, course = %course.name, "resolved course");

        let assignment_id = resolve_assignment(self.gradebook, course_id, assignment).await?;
        if assignment_id.is_none() {
            tracing::warn!(assignment, course_id, "assignment not found in course");
        }

        let identities = IdentityMapLoader::load(
            &self.config.identity_file,
            Some(RemoteIdentitySource {
                service: self.sheets,
                encoded_credentials: self.config.google_client_secret.as_deref(),
                collection_name: Some(self.config.identity_collection.as_str()),
            }),
        )
        .await;

        let repos = RepositoryDiscoverer::new(self.hosting)
            .list_matching(&self.config.org, assignment)
            .await?;

        tracing::info!("Grading: {}", assignment);
        tracing::info!(
            "Found repos: {}",
            repos.iter().map(|r| r.name.as_str()).collect::<Vec<_>>().join(", ")
        );

        let reader = WorkflowReader::new(self.hosting, &self.config.org);
        let submitter = GradeSubmitter::new(
            self.gradebook,
            &identities,
            course_id,
            assignment,
            assignment_id,
        );

        let mut report = BatchReport::new(
            assignment,
            repos.iter().map(|r| r.name.clone()).collect(),
        );
        for repo in &repos {
            let status = self.grade_one(&reader, &submitter, repo).await;
            report.record(repo.name.as_str(), status);
        }

        tracing::info!(
            graded = report.summary.graded,
            skipped = report.summary.skipped,
            failed = report.summary.failed,
            "grading complete"
        );
        Ok(report)
    }

    async fn grade_one(
        &self,
        reader: &WorkflowReader<'_, H>,
        submitter: &GradeSubmitter<'_, G>,
        repo: &RepositoryRecord,
    ) -> RepositoryStatus {
        let outcome = match reader.latest_run(&repo.name, &self.config.workflow_name).await {
            Ok(outcome) => outcome,
            Err(e) => return Self::status_for_error(repo, e),
        };

        let score = match self.scoring.score_outcome(&outcome) {
            Ok(Some(score)) => score,
            Ok(None) => {
                let reason = match &outcome {
                    WorkflowOutcome::Absent(reason) => reason.as_str(),
                    WorkflowOutcome::Completed { .. } => "no gradeable run",
                };
                tracing::info!(reason, "No workflow runs for {}", repo.name);
                return RepositoryStatus::Skipped {
                    reason: reason.to_string(),
                };
            }
            Err(e) => return Self::status_for_error(repo, e),
        };

        match submitter.submit(repo, score).await {
            Ok(graded) => RepositoryStatus::Graded {
                user_id: graded.user_id,
                score: graded.score,
            },
            Err(e) => Self::status_for_error(repo, e),
        }
    }

    fn status_for_error(repo: &RepositoryRecord, e: crate::error::Error) -> RepositoryStatus {
        if e.is_not_found() {
            tracing::info!(repo = %repo.name, reason = %e, "skipping repository");
            RepositoryStatus::Skipped {
                reason: e.to_string(),
            }
        } else {
            tracing::warn!(repo = %repo.name, error = %e, "grading repository failed");
            RepositoryStatus::Failed {
                error: e.to_string(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fakes::{completed_run, MemoryGradebook, MemoryHosting, MemorySpreadsheet};
    use crate::error::Error;
    use assert_matches::assert_matches;
    use std::collections::HashMap;
    use std::path::PathBuf;

    const TS: &str = "2024-01-15T20:00:00-06:00";

    fn config(identity_file: PathBuf) -> GraderConfig {
        let vars: HashMap<String, String> = [
            ("GITHUB_REPOSITORY", "course-org/grader"),
            ("GH_TOKEN", "ghp_x"),
            ("CANVAS_TOKEN", "canvas"),
            ("CANVAS_COURSE_ID", "1"),
        ]
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        let mut config = GraderConfig::from_env_map(&vars).unwrap();
        config.identity_file = identity_file;
        config
    }

    fn roster(dir: &tempfile::TempDir) -> PathBuf {
        let path = dir.path().join("username_map.csv");
        std::fs::write(&path, "EID,Github Username\njdoe123,janedoe\n").unwrap();
        path
    }

    #[tokio::test]
    async fn test_missing_course_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(roster(&dir));
        let hosting = MemoryHosting::new();
        let gradebook = MemoryGradebook::new(2);
        let sheets = MemorySpreadsheet::new();

        let result = Grader::new(&config, &hosting, &gradebook, &sheets).run("hw1").await;
        assert_matches!(result, Err(Error::NotFound(_)));
    }

    #[tokio::test]
    async fn test_unknown_assignment_skips_scored_repos() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(roster(&dir));
        let hosting = MemoryHosting::new()
            .with_repo("hw1-janedoe", vec![completed_run(1, "main.yml", "success", TS)]);
        let gradebook = MemoryGradebook::new(1).with_user("jdoe123", 501);
        let sheets = MemorySpreadsheet::new();

        let report = Grader::new(&config, &hosting, &gradebook, &sheets)
            .run("hw1")
            .await
            .unwrap();
        assert_matches!(report.get("hw1-janedoe"), Some(RepositoryStatus::Skipped { reason }) if reason.contains("Assignment"));
        assert!(gradebook.posted().is_empty());
    }

    #[tokio::test]
    async fn test_unfinished_run_skipped_with_reason() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(roster(&dir));
        let mut run = completed_run(1, "main.yml", "success", TS);
        run.conclusion = None;
        let hosting = MemoryHosting::new().with_repo("hw1-janedoe", vec![run]);
        let gradebook = MemoryGradebook::new(1)
            .with_assignment(10, "hw1")
            .with_user("jdoe123", 501);
        let sheets = MemorySpreadsheet::new();

        let report = Grader::new(&config, &hosting, &gradebook, &sheets)
            .run("hw1")
            .await
            .unwrap();
        assert_eq!(
            report.get("hw1-janedoe"),
            Some(&RepositoryStatus::Skipped {
                reason: "latest matching run has not concluded".to_string()
            })
        );
        assert!(gradebook.lookups().is_empty());
        assert!(gradebook.posted().is_empty());
    }

    #[tokio::test]
    async fn test_listing_error_is_failed_entry() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(roster(&dir));
        let hosting = MemoryHosting::new()
            .with_repo("hw1-janedoe", vec![])
            .with_failing_repo("hw1-janedoe");
        let gradebook = MemoryGradebook::new(1).with_assignment(10, "hw1");
        let sheets = MemorySpreadsheet::new();

        let report = Grader::new(&config, &hosting, &gradebook, &sheets)
            .run("hw1")
            .await
            .unwrap();
        assert_eq!(report.summary.failed, 1);
        assert!(!report.is_clean());
    }
}

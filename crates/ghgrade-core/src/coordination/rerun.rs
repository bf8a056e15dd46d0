//! Re-running the graded workflow across an assignment

use crate::coordination::discovery::RepositoryDiscoverer;
use crate::coordination::workflow_reader::WorkflowReader;
use crate::error::Result;
use crate::traits::HostingPlatform;
use serde::Serialize;
use std::fmt;

/// What happened to one repository's re-run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RerunStatus {
    /// The run was re-queued
    Requested {
        /// Re-run workflow run ID
        run_id: u64,
    },
    /// No matching run to re-run
    Skipped {
        /// Human-readable reason
        reason: String,
    },
    /// The platform refused or the request errored
    Failed {
        /// Error message
        error: String,
    },
}

/// Re-run result for one repository
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RerunEntry {
    /// Repository name
    pub repository: String,
    /// Outcome
    #[serde(flatten)]
    pub status: RerunStatus,
}

/// Results of re-running an assignment's workflows
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RerunReport {
    /// Assignment name
    pub assignment: String,
    /// Workflow name matched against run names
    pub workflow_name: String,
    /// One entry per repository
    pub entries: Vec<RerunEntry>,
}

impl RerunReport {
    /// Number of runs re-queued
    pub fn requested(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| matches!(e.status, RerunStatus::Requested { .. }))
            .count()
    }

    /// Number of failed requests
    pub fn failed(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| matches!(e.status, RerunStatus::Failed { .. }))
            .count()
    }
}

impl fmt::Display for RerunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Re-running {} for: {}", self.workflow_name, self.assignment)?;
        for entry in &self.entries {
            match &entry.status {
                RerunStatus::Requested { run_id } => {
                    writeln!(f, "    {}: re-run {}", entry.repository, run_id)?
                }
                RerunStatus::Skipped { reason } => {
                    writeln!(f, "    {}: skipped ({})", entry.repository, reason)?
                }
                RerunStatus::Failed { error } => {
                    writeln!(f, "    {}: failed ({})", entry.repository, error)?
                }
            }
        }
        write!(
            f,
            "{} requested, {} failed",
            self.requested(),
            self.failed()
        )
    }
}

/// Re-run the newest matching run of every repository of `assignment`
pub async fn rerun_all<H: HostingPlatform>(
    hosting: &H,
    org: &str,
    assignment: &str,
    workflow_name: &str,
) -> Result<RerunReport> {
    let repos = RepositoryDiscoverer::new(hosting)
        .list_matching(org, assignment)
        .await?;
    let reader = WorkflowReader::new(hosting, org);

    let mut report = RerunReport {
        assignment: assignment.to_string(),
        workflow_name: workflow_name.to_string(),
        entries: Vec::with_capacity(repos.len()),
    };

    for repo in repos {
        let status = match reader.latest_matching_run(&repo.name, workflow_name).await {
            Ok(Ok(run)) => match hosting.rerun_workflow(org, &repo.name, run.id).await {
                Ok(()) => {
                    tracing::info!(repo = %repo.name, run_id = run.id, "re-run requested");
                    RerunStatus::Requested { run_id: run.id }
                }
                Err(e) => {
                    tracing::warn!(repo = %repo.name, run_id = run.id, error = %e, "re-run request failed");
                    RerunStatus::Failed {
                        error: e.to_string(),
                    }
                }
            },
            Ok(Err(reason)) => RerunStatus::Skipped {
                reason: reason.as_str().to_string(),
            },
            Err(e) => {
                tracing::warn!(repo = %repo.name, error = %e, "listing workflow runs failed");
                RerunStatus::Failed {
                    error: e.to_string(),
                }
            }
        };
        report.entries.push(RerunEntry {
            repository: repo.name,
            status,
        });
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fakes::{completed_run, MemoryHosting};

    const TS: &str = "2024-01-15T20:00:00-06:00";

    #[tokio::test]
    async fn test_reruns_latest_matching_run() {
        let hosting = MemoryHosting::new()
            .with_repo(
                "hw1-a",
                vec![
                    completed_run(9, "lint", "success", TS),
                    completed_run(8, "main.yml", "failure", TS),
                    completed_run(7, "main.yml", "success", TS),
                ],
            )
            .with_repo("hw1-b", vec![])
            .with_repo("hw2-a", vec![completed_run(3, "main.yml", "failure", TS)]);

        let report = rerun_all(&hosting, "org", "hw1", "main.yml").await.unwrap();
        assert_eq!(hosting.reruns(), vec![("hw1-a".to_string(), 8)]);
        assert_eq!(report.requested(), 1);
        assert_eq!(
            report.entries[1].status,
            RerunStatus::Skipped {
                reason: "no workflow runs".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_refused_rerun_is_reported() {
        let hosting = MemoryHosting::new()
            .with_repo("hw1-a", vec![completed_run(8, "main.yml", "failure", TS)])
            .with_failing_rerun("hw1-a")
            .with_repo("hw1-b", vec![completed_run(4, "main.yml", "failure", TS)]);

        let report = rerun_all(&hosting, "org", "hw1", "main.yml").await.unwrap();
        assert_eq!(report.failed(), 1);
        assert_eq!(report.requested(), 1);
        assert_eq!(hosting.reruns(), vec![("hw1-b".to_string(), 4)]);
        assert!(report.to_string().ends_with("1 requested, 1 failed"));
    }
}

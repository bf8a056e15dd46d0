//! Latest workflow run lookup

use crate::error::Result;
use crate::traits::HostingPlatform;
use crate::types::{AbsenceReason, WorkflowConclusion, WorkflowOutcome, WorkflowRun};

/// Page size for run listings
pub const RUNS_PER_PAGE: u32 = 100;

/// GitHub returns no runs beyond this many, whatever the page
pub const MAX_LISTED_RUNS: u64 = 1000;

enum Located {
    Found(WorkflowRun),
    Missing(AbsenceReason),
}

/// Reads the most recent run of a named workflow in an organization's
/// repositories
pub struct WorkflowReader<'a, H> {
    hosting: &'a H,
    owner: &'a str,
}

impl<'a, H: HostingPlatform> WorkflowReader<'a, H> {
    /// Create a new reader for repositories owned by `owner`
    pub fn new(hosting: &'a H, owner: &'a str) -> Self {
        Self { hosting, owner }
    }

    /// Outcome of the newest run whose display name contains `workflow_name`.
    ///
    /// A matching run without a conclusion yet counts as absent. GitHub lists
    /// at most 1000 runs per repository, so a match older than that is
    /// reported as `NoMatchingRun`.
    pub async fn latest_run(&self, repo: &str, workflow_name: &str) -> Result<WorkflowOutcome> {
        let run = match self.locate(repo, workflow_name).await? {
            Located::Found(run) => run,
            Located::Missing(reason) => return Ok(WorkflowOutcome::Absent(reason)),
        };

        Ok(match run.conclusion {
            Some(conclusion) => WorkflowOutcome::Completed {
                run_id: run.id,
                run_name: run.name,
                commit_timestamp: run.head_commit_timestamp,
                conclusion: WorkflowConclusion::parse(&conclusion),
            },
            None => WorkflowOutcome::Absent(AbsenceReason::Incomplete),
        })
    }

    /// Newest matching run whatever its state, or the reason there is none
    pub async fn latest_matching_run(
        &self,
        repo: &str,
        workflow_name: &str,
    ) -> Result<std::result::Result<WorkflowRun, AbsenceReason>> {
        Ok(match self.locate(repo, workflow_name).await? {
            Located::Found(run) => Ok(run),
            Located::Missing(reason) => Err(reason),
        })
    }

    /// Conclusion of the newest matching run, `None` when absent
    pub async fn latest_conclusion(
        &self,
        repo: &str,
        workflow_name: &str,
    ) -> Result<Option<WorkflowConclusion>> {
        Ok(match self.latest_run(repo, workflow_name).await? {
            WorkflowOutcome::Completed { conclusion, .. } => Some(conclusion),
            WorkflowOutcome::Absent(_) => None,
        })
    }

    async fn locate(&self, repo: &str, workflow_name: &str) -> Result<Located> {
        let mut page = 1;
        let mut seen: u64 = 0;

        loop {
            let listing = self
                .hosting
                .list_workflow_runs(self.owner, repo, page, RUNS_PER_PAGE)
                .await?;

            if page == 1 && listing.total_count == 0 {
                return Ok(Located::Missing(AbsenceReason::NoRuns));
            }

            let count = listing.runs.len();
            seen += count as u64;
            if let Some(run) = listing
                .runs
                .into_iter()
                .find(|run| run.name.contains(workflow_name))
            {
                tracing::debug!(repo, run_id = run.id, name = %run.name, "found matching run");
                return Ok(Located::Found(run));
            }

            if count < RUNS_PER_PAGE as usize
                || seen >= listing.total_count
                || seen >= MAX_LISTED_RUNS
            {
                return Ok(Located::Missing(AbsenceReason::NoMatchingRun));
            }
            page += 1;
        }
    }
}

//! GitHub REST API client: organization repositories and Actions runs

use crate::error::{Error, Result};
use crate::http::{build_client, check_status};
use crate::traits::HostingPlatform;
use crate::types::{WorkflowRun, WorkflowRunPage};
use serde::Deserialize;
use std::future::Future;

/// Default GitHub REST endpoint
pub const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";

/// GitHub API repository object (only the fields we read)
#[derive(Debug, Deserialize)]
struct GitHubRepository {
    name: String,
}

/// GitHub API response for workflow runs list
#[derive(Debug, Deserialize)]
struct WorkflowRunsResponse {
    total_count: u64,
    #[serde(default)]
    workflow_runs: Vec<GitHubWorkflowRun>,
}

/// GitHub API workflow run object
#[derive(Debug, Deserialize)]
struct GitHubWorkflowRun {
    id: u64,
    #[serde(default)]
    name: Option<String>,
    conclusion: Option<String>,
    head_commit: Option<GitHubHeadCommit>,
}

#[derive(Debug, Deserialize)]
struct GitHubHeadCommit {
    timestamp: Option<String>,
}

impl From<GitHubWorkflowRun> for WorkflowRun {
    fn from(run: GitHubWorkflowRun) -> Self {
        WorkflowRun {
            id: run.id,
            name: run.name.unwrap_or_default(),
            conclusion: run.conclusion,
            head_commit_timestamp: run.head_commit.and_then(|c| c.timestamp),
        }
    }
}

/// GitHub API client
pub struct GitHubApiClient {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl std::fmt::Debug for GitHubApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubApiClient")
            .field("base_url", &self.base_url)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .finish_non_exhaustive()
    }
}

impl GitHubApiClient {
    /// Create a new GitHub API client
    pub fn new(base_url: impl Into<String>, token: Option<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            client: build_client(),
            base_url,
            token,
        }
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let request = request
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", "2022-11-28");
        match self.token {
            Some(ref token) => request.header("Authorization", format!("Bearer {}", token)),
            None => request,
        }
    }
}

impl HostingPlatform for GitHubApiClient {
    /// Endpoint: GET /orgs/{org}/repos
    fn list_org_repositories<'a>(
        &'a self,
        org: &'a str,
        page: u32,
        per_page: u32,
    ) -> impl Future<Output = Result<Vec<String>>> + Send + 'a {
        async move {
            let url = format!("{}/orgs/{}/repos", self.base_url, org);
            let request = self.client.get(&url).query(&[
                ("per_page", per_page.to_string()),
                ("page", page.to_string()),
                ("type", "all".to_string()),
            ]);

            let response = self
                .authorize(request)
                .send()
                .await
                .map_err(|e| Error::Http(format!("Failed to list repositories for {}: {}", org, e)))?;
            let response = check_status(response, &format!("Listing repositories of {}", org))?;

            let repos: Vec<GitHubRepository> = response.json().await.map_err(|e| {
                Error::Format(format!("Failed to parse repository list: {}", e))
            })?;

            Ok(repos.into_iter().map(|r| r.name).collect())
        }
    }

    /// Endpoint: GET /repos/{owner}/{repo}/actions/runs
    fn list_workflow_runs<'a>(
        &'a self,
        owner: &'a str,
        repo: &'a str,
        page: u32,
        per_page: u32,
    ) -> impl Future<Output = Result<WorkflowRunPage>> + Send + 'a {
        async move {
            let url = format!("{}/repos/{}/{}/actions/runs", self.base_url, owner, repo);
            let request = self.client.get(&url).query(&[
                ("per_page", per_page.to_string()),
                ("page", page.to_string()),
            ]);

            let response = self
                .authorize(request)
                .send()
                .await
                .map_err(|e| Error::Http(format!("Failed to fetch workflow runs: {}", e)))?;
            let response = check_status(response, &format!("Listing workflow runs of {}", repo))?;

            let runs: WorkflowRunsResponse = response.json().await.map_err(|e| {
                Error::Format(format!("Failed to parse workflow runs response: {}", e))
            })?;

            Ok(WorkflowRunPage {
                total_count: runs.total_count,
                runs: runs.workflow_runs.into_iter().map(WorkflowRun::from).collect(),
            })
        }
    }

    /// Endpoint: POST /repos/{owner}/{repo}/actions/runs/{run_id}/rerun
    fn rerun_workflow<'a>(
        &'a self,
        owner: &'a str,
        repo: &'a str,
        run_id: u64,
    ) -> impl Future<Output = Result<()>> + Send + 'a {
        async move {
            let url = format!(
                "{}/repos/{}/{}/actions/runs/{}/rerun",
                self.base_url, owner, repo, run_id
            );

            let response = self
                .authorize(self.client.post(&url))
                .send()
                .await
                .map_err(|e| Error::Http(format!("Failed to re-run workflow {}: {}", run_id, e)))?;
            check_status(response, &format!("Re-running workflow run {} of {}", run_id, repo))?;

            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_github_client_creation() {
        let client = GitHubApiClient::new("https://api.github.com/", None);
        assert_eq!(client.base_url, "https://api.github.com");
        assert!(client.token.is_none());
    }

    #[test]
    fn test_github_client_debug_redacts_token() {
        let client = GitHubApiClient::new(
            DEFAULT_GITHUB_API_URL,
            Some("ghp_GraderSecret42".to_string()),
        );
        let debug_output = format!("{:?}", client);
        assert!(!debug_output.contains("ghp_GraderSecret42"));
        assert!(debug_output.contains("<redacted>"));
    }

    #[test]
    fn test_workflow_runs_response_parsing() {
        let body = r#"{
            "total_count": 2,
            "workflow_runs": [
                {
                    "id": 42,
                    "name": "GitHub Classroom Workflow main.yml",
                    "status": "completed",
                    "conclusion": "success",
                    "head_commit": {"id": "abc", "timestamp": "2024-01-16T06:05:00Z"}
                },
                {
                    "id": 41,
                    "name": "Lint",
                    "status": "in_progress",
                    "conclusion": null,
                    "head_commit": null
                }
            ]
        }"#;

        let parsed: WorkflowRunsResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.total_count, 2);

        let runs: Vec<WorkflowRun> = parsed.workflow_runs.into_iter().map(Into::into).collect();
        assert_eq!(runs[0].id, 42);
        assert_eq!(runs[0].conclusion.as_deref(), Some("success"));
        assert_eq!(
            runs[0].head_commit_timestamp.as_deref(),
            Some("2024-01-16T06:05:00Z")
        );
        assert_eq!(runs[1].conclusion, None);
        assert_eq!(runs[1].head_commit_timestamp, None);
    }

    #[test]
    fn test_empty_runs_response_parsing() {
        let parsed: WorkflowRunsResponse =
            serde_json::from_str(r#"{"total_count": 0, "workflow_runs": []}"#).unwrap();
        assert_eq!(parsed.total_count, 0);
        assert!(parsed.workflow_runs.is_empty());
    }
}

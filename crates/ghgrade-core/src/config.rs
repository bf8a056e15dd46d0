//! Run configuration
//!
//! Built once from an environment snapshot plus `--env NAME VALUE` overrides,
//! then passed by reference to every component. The process environment is
//! never modified.

use crate::error::{Error, Result};
use crate::http::canvas::DEFAULT_CANVAS_URL;
use crate::http::github::DEFAULT_GITHUB_API_URL;
use crate::identity::DEFAULT_IDENTITY_FILE;
use std::collections::HashMap;
use std::path::PathBuf;

/// `owner/repo` slug of the repository running the grader
pub const ENV_REPOSITORY: &str = "GITHUB_REPOSITORY";
/// GitHub token
pub const ENV_GH_TOKEN: &str = "GH_TOKEN";
/// Canvas token
pub const ENV_CANVAS_TOKEN: &str = "CANVAS_TOKEN";
/// Canvas course ID
pub const ENV_CANVAS_COURSE_ID: &str = "CANVAS_COURSE_ID";
/// Base64 service-account credentials for the roster sheet
pub const ENV_GOOGLE_CLIENT_SECRET: &str = "GOOGLE_CLIENT_SECRET";
/// Canvas instance URL
pub const ENV_CANVAS_URL: &str = "CANVAS_URL";
/// GitHub REST endpoint
pub const ENV_GITHUB_API_URL: &str = "GITHUB_API_URL";

/// Workflow whose runs are graded
pub const DEFAULT_WORKFLOW_NAME: &str = "main.yml";

/// Grader configuration
#[derive(Clone)]
pub struct GraderConfig {
    /// GitHub organization holding the assignment repositories
    pub org: String,
    /// GitHub token
    pub github_token: String,
    /// GitHub REST endpoint
    pub github_api_url: String,
    /// Canvas instance URL
    pub canvas_url: String,
    canvas_token: Option<String>,
    canvas_course_id: Option<String>,
    /// Encoded service-account credentials, if configured
    pub google_client_secret: Option<String>,
    /// Local identity file checked before the remote sheet
    pub identity_file: PathBuf,
    /// Collection name of the roster sheet; defaults to the organization
    pub identity_collection: String,
    /// Substring identifying the graded workflow's runs
    pub workflow_name: String,
}

impl std::fmt::Debug for GraderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraderConfig")
            .field("org", &self.org)
            .field("github_token", &"<redacted>")
            .field("github_api_url", &self.github_api_url)
            .field("canvas_url", &self.canvas_url)
            .field("canvas_token", &self.canvas_token.as_ref().map(|_| "<redacted>"))
            .field("canvas_course_id", &self.canvas_course_id)
            .field(
                "google_client_secret",
                &self.google_client_secret.as_ref().map(|_| "<redacted>"),
            )
            .field("identity_file", &self.identity_file)
            .field("identity_collection", &self.identity_collection)
            .field("workflow_name", &self.workflow_name)
            .finish()
    }
}

/// Non-empty value of a variable
fn lookup<'a>(vars: &'a HashMap<String, String>, name: &str) -> Option<&'a str> {
    vars.get(name).map(|v| v.trim()).filter(|v| !v.is_empty())
}

fn require<'a>(vars: &'a HashMap<String, String>, name: &str) -> Result<&'a str> {
    lookup(vars, name).ok_or_else(|| Error::Config(format!("{} not set", name)))
}

impl GraderConfig {
    /// Build from the process environment with overrides applied on top
    pub fn from_env<I>(overrides: I) -> Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut vars: HashMap<String, String> = std::env::vars().collect();
        vars.extend(overrides);
        Self::from_env_map(&vars)
    }

    /// Build from an explicit variable map
    pub fn from_env_map(vars: &HashMap<String, String>) -> Result<Self> {
        let repository = require(vars, ENV_REPOSITORY)?;
        let org = repository
            .split('/')
            .next()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| {
                Error::Config(format!("Invalid {} format: {}", ENV_REPOSITORY, repository))
            })?
            .to_string();

        Ok(Self {
            github_token: require(vars, ENV_GH_TOKEN)?.to_string(),
            github_api_url: lookup(vars, ENV_GITHUB_API_URL)
                .unwrap_or(DEFAULT_GITHUB_API_URL)
                .to_string(),
            canvas_url: lookup(vars, ENV_CANVAS_URL)
                .unwrap_or(DEFAULT_CANVAS_URL)
                .to_string(),
            canvas_token: lookup(vars, ENV_CANVAS_TOKEN).map(str::to_string),
            canvas_course_id: lookup(vars, ENV_CANVAS_COURSE_ID).map(str::to_string),
            google_client_secret: lookup(vars, ENV_GOOGLE_CLIENT_SECRET).map(str::to_string),
            identity_file: PathBuf::from(DEFAULT_IDENTITY_FILE),
            identity_collection: org.clone(),
            workflow_name: DEFAULT_WORKFLOW_NAME.to_string(),
            org,
        })
    }

    /// Canvas token; required for grading runs only
    pub fn canvas_token(&self) -> Result<&str> {
        self.canvas_token
            .as_deref()
            .ok_or_else(|| Error::Config(format!("{} not set", ENV_CANVAS_TOKEN)))
    }

    /// Canvas course ID; required for grading runs only
    pub fn canvas_course_id(&self) -> Result<u64> {
        let raw = self
            .canvas_course_id
            .as_deref()
            .ok_or_else(|| Error::Config(format!("{} not set", ENV_CANVAS_COURSE_ID)))?;
        raw.parse().map_err(|_| {
            Error::Config(format!("{} must be a numeric course ID, got '{}'", ENV_CANVAS_COURSE_ID, raw))
        })
    }
}

//! # ghgrade Core
//!
//! Grades student repositories from their GitHub Actions results and posts
//! the scores to a Canvas gradebook.
//!
//! Every repository of an organization whose name contains the assignment
//! name is graded independently:
//! - the latest run of the graded workflow is read
//! - its conclusion (and optionally the commit time against a due date) is
//!   turned into a score
//! - the GitHub username embedded in the repository name is mapped to an
//!   institutional ID through a roster file or Google Sheet
//! - the score is posted to the matching Canvas user
//!
//! The external platforms sit behind the traits in [`traits`]; the HTTP
//! clients live in [`http`] and in-memory doubles in [`fakes`].
//!
//! ## Example
//!
//! ```no_run
//! use ghgrade_core::http::{CanvasApiClient, GitHubApiClient, GoogleSheetsClient};
//! use ghgrade_core::{Grader, GraderConfig};
//!
//! # async fn example() -> ghgrade_core::Result<()> {
//! let config = GraderConfig::from_env(Vec::new())?;
//! let github = GitHubApiClient::new(config.github_api_url.clone(), Some(config.github_token.clone()));
//! let canvas = CanvasApiClient::new(config.canvas_url.clone(), config.canvas_token()?);
//! let sheets = GoogleSheetsClient::new();
//!
//! let report = Grader::new(&config, &github, &canvas, &sheets).run("hw1").await?;
//! println!("{}", report);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs, rust_2018_idioms)]

pub mod config;
pub mod coordination;
pub mod credentials;
pub mod error;
pub mod fakes;
pub mod http;
pub mod identity;
pub mod scoring;
pub mod traits;
pub mod types;

pub use config::GraderConfig;
pub use coordination::{
    BatchReport, Grader, GradeSubmitter, RepositoryDiscoverer, RepositoryReport,
    RepositoryStatus, RerunReport, WorkflowReader,
};
pub use error::{Error, ErrorKind, Result};
pub use identity::{IdentityMapLoader, IdentityMapping, IdentitySource};
pub use scoring::{Comparator, DueDateConfig, LatePolicy, ScoringEngine};
pub use types::{RepositoryRecord, WorkflowConclusion, WorkflowOutcome};

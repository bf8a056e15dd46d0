//! Main coordination logic

pub mod discovery;
pub mod grader;
pub mod report;
pub mod rerun;
pub mod submitter;
pub mod workflow_reader;

pub use discovery::RepositoryDiscoverer;
pub use grader::Grader;
pub use report::{BatchReport, BatchSummary, RepositoryReport, RepositoryStatus};
pub use rerun::{rerun_all, RerunEntry, RerunReport, RerunStatus};
pub use submitter::{resolve_assignment, GradeSubmitter, SubmittedGrade};
pub use workflow_reader::WorkflowReader;

//! Trait seams for the three external platforms
//!
//! Components are generic over these traits so the pipeline can run against
//! the HTTP clients in [`crate::http`] or the in-memory fakes in
//! [`crate::fakes`]. Futures are returned as `impl Future + Send`: static
//! dispatch, no boxing.

use crate::error::Result;
use crate::credentials::ServiceAccountKey;
use crate::types::{Assignment, Course, GradebookUser, Submission, WorkflowRunPage};
use std::future::Future;

/// Code-hosting platform: repositories and CI runs
pub trait HostingPlatform {
    /// List one page of repository names for an organization.
    ///
    /// An empty page marks the end of the listing.
    fn list_org_repositories<'a>(
        &'a self,
        org: &'a str,
        page: u32,
        per_page: u32,
    ) -> impl Future<Output = Result<Vec<String>>> + Send + 'a;

    /// List one page of workflow runs for a repository, newest first
    fn list_workflow_runs<'a>(
        &'a self,
        owner: &'a str,
        repo: &'a str,
        page: u32,
        per_page: u32,
    ) -> impl Future<Output = Result<WorkflowRunPage>> + Send + 'a;

    /// Re-run a workflow run by ID
    fn rerun_workflow<'a>(
        &'a self,
        owner: &'a str,
        repo: &'a str,
        run_id: u64,
    ) -> impl Future<Output = Result<()>> + Send + 'a;
}

/// Learning-management-system gradebook
pub trait Gradebook {
    /// Fetch a course by ID
    fn get_course(&self, course_id: u64) -> impl Future<Output = Result<Course>> + Send + '_;

    /// List every assignment of a course
    fn list_assignments(
        &self,
        course_id: u64,
    ) -> impl Future<Output = Result<Vec<Assignment>>> + Send + '_;

    /// Resolve an institutional login to a gradebook user.
    ///
    /// Returns `Error::NotFound` when no enrolled user has that login.
    fn user_by_sis_login<'a>(
        &'a self,
        course_id: u64,
        login: &'a str,
    ) -> impl Future<Output = Result<GradebookUser>> + Send + 'a;

    /// Fetch a user's submission for an assignment
    fn get_submission(
        &self,
        course_id: u64,
        assignment_id: u64,
        user_id: u64,
    ) -> impl Future<Output = Result<Submission>> + Send + '_;

    /// Set the posted grade of a user's submission
    fn set_posted_grade(
        &self,
        course_id: u64,
        assignment_id: u64,
        user_id: u64,
        score: f64,
    ) -> impl Future<Output = Result<()>> + Send + '_;
}

/// Spreadsheet service holding the GitHub username roster
pub trait SpreadsheetService {
    /// Read every row (header row first) of the first worksheet of the
    /// spreadsheet with the given title, authenticating as `credentials`.
    fn read_rows<'a>(
        &'a self,
        credentials: &'a ServiceAccountKey,
        spreadsheet_name: &'a str,
    ) -> impl Future<Output = Result<Vec<Vec<String>>>> + Send + 'a;
}

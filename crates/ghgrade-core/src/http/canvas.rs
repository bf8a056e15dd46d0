//! Canvas LMS REST API client

use crate::error::{Error, Result};
use crate::http::{build_client, check_status, has_next_page};
use crate::traits::Gradebook;
use crate::types::{Assignment, Course, GradebookUser, Submission};
use serde::Deserialize;
use std::future::Future;

/// Default Canvas instance
pub const DEFAULT_CANVAS_URL: &str = "https://utexas.instructure.com";

/// Upper bound on assignment pages, 100 per page
const MAX_PAGES: u32 = 100;

#[derive(Debug, Deserialize)]
struct CanvasCourse {
    id: u64,
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CanvasAssignment {
    id: u64,
    name: String,
}

#[derive(Debug, Deserialize)]
struct CanvasUser {
    id: u64,
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CanvasSubmission {
    user_id: u64,
    #[serde(default)]
    grade: Option<String>,
}

/// Canvas API client
pub struct CanvasApiClient {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

impl std::fmt::Debug for CanvasApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CanvasApiClient")
            .field("base_url", &self.base_url)
            .field("token", &"<redacted>")
            .finish_non_exhaustive()
    }
}

impl CanvasApiClient {
    /// Create a new Canvas API client for an instance URL
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            client: build_client(),
            base_url,
            token: token.into(),
        }
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}/api/v1/{}", self.base_url, path)
    }

    fn submission_url(&self, course_id: u64, assignment_id: u64, user_id: u64) -> String {
        self.api_url(&format!(
            "courses/{}/assignments/{}/submissions/{}",
            course_id, assignment_id, user_id
        ))
    }

    /// URL of a course user addressed by SIS login, with the login escaped
    fn sis_user_url(&self, course_id: u64, login: &str) -> Result<reqwest::Url> {
        let mut url = reqwest::Url::parse(&self.api_url(&format!("courses/{}/users", course_id)))
            .map_err(|e| Error::Config(format!("Invalid Canvas URL '{}': {}", self.base_url, e)))?;
        url.path_segments_mut()
            .map_err(|_| Error::Config(format!("Canvas URL cannot be a base: {}", self.base_url)))?
            .push(&format!("sis_login_id:{}", login));
        Ok(url)
    }

    async fn send(&self, request: reqwest::RequestBuilder, what: &str) -> Result<reqwest::Response> {
        let response = request
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| Error::Http(format!("{}: {}", what, e)))?;
        check_status(response, what)
    }
}

impl Gradebook for CanvasApiClient {
    /// Endpoint: GET /api/v1/courses/:id
    fn get_course(&self, course_id: u64) -> impl Future<Output = Result<Course>> + Send + '_ {
        async move {
            let url = self.api_url(&format!("courses/{}", course_id));
            let response = self
                .send(self.client.get(&url), &format!("Fetching course {}", course_id))
                .await?;
            let course: CanvasCourse = response
                .json()
                .await
                .map_err(|e| Error::Format(format!("Failed to parse course: {}", e)))?;

            Ok(Course {
                id: course.id,
                name: course.name.unwrap_or_default(),
            })
        }
    }

    /// Endpoint: GET /api/v1/courses/:id/assignments, following `Link` pagination
    fn list_assignments(
        &self,
        course_id: u64,
    ) -> impl Future<Output = Result<Vec<Assignment>>> + Send + '_ {
        async move {
            let url = self.api_url(&format!("courses/{}/assignments", course_id));
            let mut assignments = Vec::new();
            let mut page = 1u32;

            loop {
                let page_param = page.to_string();
                let request = self
                    .client
                    .get(&url)
                    .query(&[("per_page", "100"), ("page", page_param.as_str())]);
                let response = self
                    .send(request, &format!("Listing assignments of course {}", course_id))
                    .await?;

                let has_next = has_next_page(response.headers());

                let batch: Vec<CanvasAssignment> = response
                    .json()
                    .await
                    .map_err(|e| Error::Format(format!("Failed to parse assignments: {}", e)))?;

                assignments.extend(batch.into_iter().map(|a| Assignment {
                    id: a.id,
                    name: a.name,
                }));

                if !has_next {
                    break;
                }

                page += 1;
                if page > MAX_PAGES {
                    return Err(Error::Other(
                        "Too many pages in Canvas assignment listing".to_string(),
                    ));
                }
            }

            Ok(assignments)
        }
    }

    /// Endpoint: GET /api/v1/courses/:id/users/sis_login_id::login
    fn user_by_sis_login<'a>(
        &'a self,
        course_id: u64,
        login: &'a str,
    ) -> impl Future<Output = Result<GradebookUser>> + Send + 'a {
        async move {
            let url = self.sis_user_url(course_id, login)?;
            let response = self
                .send(
                    self.client.get(url),
                    &format!("Looking up Canvas user with login '{}'", login),
                )
                .await?;
            let user: CanvasUser = response
                .json()
                .await
                .map_err(|e| Error::Format(format!("Failed to parse user: {}", e)))?;

            Ok(GradebookUser {
                id: user.id,
                name: user.name,
            })
        }
    }

    /// Endpoint: GET /api/v1/courses/:id/assignments/:aid/submissions/:uid
    fn get_submission(
        &self,
        course_id: u64,
        assignment_id: u64,
        user_id: u64,
    ) -> impl Future<Output = Result<Submission>> + Send + '_ {
        async move {
            let url = self.submission_url(course_id, assignment_id, user_id);
            let response = self
                .send(
                    self.client.get(&url),
                    &format!("Fetching submission of user {}", user_id),
                )
                .await?;
            let submission: CanvasSubmission = response
                .json()
                .await
                .map_err(|e| Error::Format(format!("Failed to parse submission: {}", e)))?;

            Ok(Submission {
                user_id: submission.user_id,
                grade: submission.grade,
            })
        }
    }

    /// Endpoint: PUT /api/v1/courses/:id/assignments/:aid/submissions/:uid
    fn set_posted_grade(
        &self,
        course_id: u64,
        assignment_id: u64,
        user_id: u64,
        score: f64,
    ) -> impl Future<Output = Result<()>> + Send + '_ {
        async move {
            let url = self.submission_url(course_id, assignment_id, user_id);
            let request = self
                .client
                .put(&url)
                .form(&[("submission[posted_grade]", score.to_string())]);
            self.send(request, &format!("Posting grade for user {}", user_id))
                .await?;
            Ok(())
        }
    }
}

//! Grade submission to the gradebook

use crate::error::{Error, Result};
use crate::identity::IdentityMapping;
use crate::traits::Gradebook;
use crate::types::RepositoryRecord;

/// Find an assignment ID by exact name
pub async fn resolve_assignment<G: Gradebook>(
    gradebook: &G,
    course_id: u64,
    name: &str,
) -> Result<Option<u64>> {
    let assignments = gradebook.list_assignments(course_id).await?;
    Ok(assignments.into_iter().find(|a| a.name == name).map(|a| a.id))
}

/// A grade that was posted
#[derive(Debug, Clone, PartialEq)]
pub struct SubmittedGrade {
    /// Institutional ID the owner handle resolved to
    pub institutional_id: String,
    /// Gradebook user ID
    pub user_id: u64,
    /// Posted score
    pub score: f64,
}

/// Posts scores for one assignment
pub struct GradeSubmitter<'a, G> {
    gradebook: &'a G,
    identities: &'a IdentityMapping,
    course_id: u64,
    assignment_name: &'a str,
    assignment_id: Option<u64>,
}

impl<'a, G: Gradebook> GradeSubmitter<'a, G> {
    /// Create a submitter. `assignment_id` is `None` when the assignment
    /// name did not resolve; every submission then fails with `NotFound`.
    pub fn new(
        gradebook: &'a G,
        identities: &'a IdentityMapping,
        course_id: u64,
        assignment_name: &'a str,
        assignment_id: Option<u64>,
    ) -> Self {
        Self {
            gradebook,
            identities,
            course_id,
            assignment_name,
            assignment_id,
        }
    }

    /// Resolve the repository owner and post the score
    pub async fn submit(&self, repo: &RepositoryRecord, score: f64) -> Result<SubmittedGrade> {
        let assignment_id = self.assignment_id.ok_or_else(|| {
            Error::NotFound(format!(
                "Assignment '{}' not found in course {}",
                self.assignment_name, self.course_id
            ))
        })?;

        let institutional_id = self.identities.lookup(&repo.owner_handle).ok_or_else(|| {
            Error::NotFound(format!(
                "No institutional ID for GitHub user '{}'",
                repo.owner_handle
            ))
        })?;

        let user = self
            .gradebook
            .user_by_sis_login(self.course_id, institutional_id)
            .await?;

        let current = self
            .gradebook
            .get_submission(self.course_id, assignment_id, user.id)
            .await?;
        tracing::debug!(
            repo = %repo.name,
            user_id = user.id,
            current = ?current.grade,
            "current submission"
        );

        self.gradebook
            .set_posted_grade(self.course_id, assignment_id, user.id, score)
            .await?;
        tracing::info!("Updated grade: {} = {}", institutional_id, score);

        Ok(SubmittedGrade {
            institutional_id: institutional_id.to_string(),
            user_id: user.id,
            score,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fakes::{MemoryGradebook, PostedGrade};
    use crate::identity::IdentitySource;
    use assert_matches::assert_matches;

    fn identities() -> IdentityMapping {
        IdentityMapping::from_pairs(IdentitySource::Unavailable, [("JDOE123", "JaneDoe")])
    }

    #[tokio::test]
    async fn test_resolve_assignment_exact_name() {
        let gradebook = MemoryGradebook::new(1)
            .with_assignment(10, "hw1")
            .with_assignment(11, "hw1 resubmission");
        assert_eq!(resolve_assignment(&gradebook, 1, "hw1").await.unwrap(), Some(10));
        assert_eq!(resolve_assignment(&gradebook, 1, "HW1").await.unwrap(), None);
        assert!(resolve_assignment(&gradebook, 2, "hw1").await.is_err());
    }

    #[tokio::test]
    async fn test_submit_posts_grade() {
        let gradebook = MemoryGradebook::new(1).with_user("jdoe123", 501);
        let ids = identities();
        let submitter = GradeSubmitter::new(&gradebook, &ids, 1, "hw1", Some(10));

        let graded = submitter
            .submit(&RepositoryRecord::new("hw1-janedoe"), 1.0)
            .await
            .unwrap();
        assert_eq!(graded.user_id, 501);
        assert_eq!(graded.institutional_id, "jdoe123");
        assert_eq!(
            gradebook.posted(),
            vec![PostedGrade {
                assignment_id: 10,
                user_id: 501,
                score: 1.0
            }]
        );
    }

    #[tokio::test]
    async fn test_unmapped_handle_not_found() {
        let gradebook = MemoryGradebook::new(1).with_user("jdoe123", 501);
        let ids = identities();
        let submitter = GradeSubmitter::new(&gradebook, &ids, 1, "hw1", Some(10));

        let err = submitter
            .submit(&RepositoryRecord::new("hw1-johndoe"), 1.0)
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        assert!(gradebook.lookups().is_empty());
        assert!(gradebook.posted().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_gradebook_user_not_found() {
        let gradebook = MemoryGradebook::new(1);
        let ids = identities();
        let submitter = GradeSubmitter::new(&gradebook, &ids, 1, "hw1", Some(10));

        let err = submitter
            .submit(&RepositoryRecord::new("hw1-janedoe"), 0.0)
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(gradebook.lookups(), vec!["jdoe123"]);
    }

    #[tokio::test]
    async fn test_missing_assignment_not_found() {
        let gradebook = MemoryGradebook::new(1).with_user("jdoe123", 501);
        let ids = identities();
        let submitter = GradeSubmitter::new(&gradebook, &ids, 1, "hw9", None);

        assert_matches!(
            submitter.submit(&RepositoryRecord::new("hw9-janedoe"), 1.0).await,
            Err(Error::NotFound(_))
        );
        assert!(gradebook.posted().is_empty());
    }

    #[tokio::test]
    async fn test_posting_error_propagates() {
        let gradebook = MemoryGradebook::new(1)
            .with_user("jdoe123", 501)
            .with_failing_user(501);
        let ids = identities();
        let submitter = GradeSubmitter::new(&gradebook, &ids, 1, "hw1", Some(10));

        assert_matches!(
            submitter.submit(&RepositoryRecord::new("hw1-janedoe"), 1.0).await,
            Err(Error::Api { status: 403, .. })
        );
    }
}

//! Assignment repository discovery

use crate::error::Result;
use crate::traits::HostingPlatform;
use crate::types::RepositoryRecord;

/// Page size for organization listings
pub const REPOS_PER_PAGE: u32 = 100;

/// Lists the organization repositories belonging to an assignment
pub struct RepositoryDiscoverer<'a, H> {
    hosting: &'a H,
}

impl<'a, H: HostingPlatform> RepositoryDiscoverer<'a, H> {
    /// Create a new discoverer
    pub fn new(hosting: &'a H) -> Self {
        Self { hosting }
    }

    /// Every repository of `org` whose name contains `substring`, in listing
    /// order. Pages are requested until an empty or short page.
    pub async fn list_matching(&self, org: &str, substring: &str) -> Result<Vec<RepositoryRecord>> {
        let mut matching = Vec::new();
        let mut page = 1;

        loop {
            let names = self
                .hosting
                .list_org_repositories(org, page, REPOS_PER_PAGE)
                .await?;
            let count = names.len();
            tracing::debug!(org, page, count, "listed organization repositories");

            matching.extend(
                names
                    .into_iter()
                    .filter(|name| name.contains(substring))
                    .map(RepositoryRecord::new),
            );

            if count < REPOS_PER_PAGE as usize {
                break;
            }
            page += 1;
        }

        Ok(matching)
    }
}

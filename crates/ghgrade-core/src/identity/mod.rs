//! GitHub username to institutional ID mapping

pub mod loader;

pub use loader::{IdentityMapLoader, RemoteIdentitySource, DEFAULT_IDENTITY_FILE};

use std::collections::HashMap;
use std::path::PathBuf;

/// Column holding the institutional ID
pub const EID_COLUMN: &str = "EID";

/// Column holding the GitHub username
pub const USERNAME_COLUMN: &str = "Github Username";

/// Where a mapping was loaded from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentitySource {
    /// Local CSV file
    LocalFile(PathBuf),
    /// Remote spreadsheet, by title
    RemoteSheet(String),
    /// No source could be used; every lookup misses
    Unavailable,
}

/// Case-insensitive table from owner handle to institutional ID.
///
/// Both sides are lowercased on insertion and queries are lowercased on
/// lookup. A repeated handle overwrites the earlier entry.
#[derive(Debug, Clone)]
pub struct IdentityMapping {
    entries: HashMap<String, String>,
    source: IdentitySource,
}

impl IdentityMapping {
    /// Empty mapping with the given source
    pub fn new(source: IdentitySource) -> Self {
        Self {
            entries: HashMap::new(),
            source,
        }
    }

    /// Mapping that resolves nothing
    pub fn unavailable() -> Self {
        Self::new(IdentitySource::Unavailable)
    }

    /// Build from `(institutional id, username)` pairs
    pub fn from_pairs<I, A, B>(source: IdentitySource, pairs: I) -> Self
    where
        I: IntoIterator<Item = (A, B)>,
        A: AsRef<str>,
        B: AsRef<str>,
    {
        let mut mapping = Self::new(source);
        for (id, username) in pairs {
            mapping.insert(username.as_ref(), id.as_ref());
        }
        mapping
    }

    /// Insert a username → institutional ID entry
    pub fn insert(&mut self, username: &str, institutional_id: &str) {
        self.entries.insert(
            username.trim().to_lowercase(),
            institutional_id.trim().to_lowercase(),
        );
    }

    /// Look up the institutional ID of a handle, ignoring case
    pub fn lookup(&self, handle: &str) -> Option<&str> {
        self.entries
            .get(&handle.trim().to_lowercase())
            .map(String::as_str)
    }

    /// Number of entries
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing can resolve
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Where the entries came from
    #[inline]
    pub fn source(&self) -> &IdentitySource {
        &self.source
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_ignores_case() {
        let mapping = IdentityMapping::from_pairs(
            IdentitySource::Unavailable,
            [("JDOE123", "Alice")],
        );
        assert_eq!(mapping.lookup("Alice"), Some("jdoe123"));
        assert_eq!(mapping.lookup("ALICE"), Some("jdoe123"));
        assert_eq!(mapping.lookup("alice"), Some("jdoe123"));
        assert_eq!(mapping.lookup("bob"), None);
    }

    #[test]
    fn test_duplicate_handle_last_wins() {
        let mapping = IdentityMapping::from_pairs(
            IdentitySource::Unavailable,
            [("first", "octocat"), ("second", "OctoCat")],
        );
        assert_eq!(mapping.len(), 1);
        assert_eq!(mapping.lookup("octocat"), Some("second"));
    }

    #[test]
    fn test_unavailable_is_empty() {
        let mapping = IdentityMapping::unavailable();
        assert!(mapping.is_empty());
        assert_eq!(mapping.source(), &IdentitySource::Unavailable);
        assert_eq!(mapping.lookup("anyone"), None);
    }

    #[test]
    fn test_insert_trims() {
        let mut mapping = IdentityMapping::new(IdentitySource::Unavailable);
        mapping.insert("  janedoe ", " JD123 ");
        assert_eq!(mapping.lookup("janedoe"), Some("jd123"));
    }
}

//! Identity map loading from a local CSV file or a Google Sheet

use crate::credentials::ServiceAccountKey;
use crate::error::{Error, Result};
use crate::identity::{IdentityMapping, IdentitySource, EID_COLUMN, USERNAME_COLUMN};
use crate::traits::SpreadsheetService;
use std::path::Path;

/// Conventional name of the local identity file
pub const DEFAULT_IDENTITY_FILE: &str = "username_map.csv";

/// Spreadsheet title for a collection (course organization)
pub fn sheet_title(collection_name: &str) -> String {
    format!("{} Github Names", collection_name)
}

/// Remote roster settings. Both the credentials and the collection name must
/// be present for the remote source to be consulted.
pub struct RemoteIdentitySource<'a, S> {
    /// Spreadsheet service client
    pub service: &'a S,
    /// Base64 service-account token
    pub encoded_credentials: Option<&'a str>,
    /// Collection name; the sheet is `"{collection_name} Github Names"`
    pub collection_name: Option<&'a str>,
}

/// Identity map loader
pub struct IdentityMapLoader;

impl IdentityMapLoader {
    /// Load the mapping: local file first, then the remote sheet.
    ///
    /// Never fails. Any problem is logged and yields an empty mapping with
    /// source [`IdentitySource::Unavailable`], so grading continues and every
    /// lookup is skipped.
    pub async fn load<S: SpreadsheetService>(
        local_file: &Path,
        remote: Option<RemoteIdentitySource<'_, S>>,
    ) -> IdentityMapping {
        if local_file.is_file() {
            return match Self::load_local(local_file) {
                Ok(mapping) => {
                    tracing::info!(
                        path = %local_file.display(),
                        entries = mapping.len(),
                        "loaded username map from file"
                    );
                    mapping
                }
                Err(e) => {
                    tracing::warn!(path = %local_file.display(), error = %e, "cannot read username map");
                    IdentityMapping::unavailable()
                }
            };
        }

        let remote = remote.and_then(|r| match (r.encoded_credentials, r.collection_name) {
            (Some(creds), Some(name)) if !creds.trim().is_empty() && !name.is_empty() => {
                Some((r.service, creds, name))
            }
            _ => None,
        });

        match remote {
            Some((service, credentials, collection)) => {
                match Self::load_remote(service, credentials, collection).await {
                    Ok(mapping) => {
                        tracing::info!(
                            sheet = %sheet_title(collection),
                            entries = mapping.len(),
                            "loaded username map from Google Sheet"
                        );
                        mapping
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "Error reading Google Sheet");
                        IdentityMapping::unavailable()
                    }
                }
            }
            None => {
                let err = Error::Config(format!(
                    "You must specify a username map from a file named \"{}\" or a Google Sheet",
                    local_file.display()
                ));
                tracing::warn!("{}", err);
                IdentityMapping::unavailable()
            }
        }
    }

    /// Parse a CSV file with `EID` and `Github Username` columns
    pub fn load_local(path: &Path) -> Result<IdentityMapping> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_path(path)
            .map_err(|e| Error::Format(format!("Cannot open '{}': {}", path.display(), e)))?;

        let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
        let mut rows = Vec::new();
        for record in reader.records() {
            rows.push(record?.iter().map(str::to_string).collect());
        }

        mapping_from_rows(
            IdentitySource::LocalFile(path.to_path_buf()),
            &headers,
            rows,
        )
    }

    /// Read the roster sheet of a collection through a spreadsheet service
    pub async fn load_remote<S: SpreadsheetService>(
        service: &S,
        encoded_credentials: &str,
        collection_name: &str,
    ) -> Result<IdentityMapping> {
        let credentials = ServiceAccountKey::from_token(encoded_credentials)?;
        let title = sheet_title(collection_name);
        let mut rows = service.read_rows(&credentials, &title).await?.into_iter();

        let headers = rows
            .next()
            .ok_or_else(|| Error::Format(format!("Sheet '{}' is empty", title)))?;

        mapping_from_rows(IdentitySource::RemoteSheet(title), &headers, rows)
    }
}

/// Index rows by the username column, given a header row
fn mapping_from_rows<I>(source: IdentitySource, headers: &[String], rows: I) -> Result<IdentityMapping>
where
    I: IntoIterator<Item = Vec<String>>,
{
    let column = |name: &str| {
        headers
            .iter()
            .position(|h| h.trim() == name)
            .ok_or_else(|| Error::Format(format!("Missing column '{}'", name)))
    };
    let eid_idx = column(EID_COLUMN)?;
    let user_idx = column(USERNAME_COLUMN)?;

    let mut mapping = IdentityMapping::new(source);
    for row in rows {
        let eid = row.get(eid_idx).map(|s| s.trim()).unwrap_or("");
        let username = row.get(user_idx).map(|s| s.trim()).unwrap_or("");
        if eid.is_empty() || username.is_empty() {
            continue;
        }
        mapping.insert(username, eid);
    }

    Ok(mapping)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fakes::MemorySpreadsheet;
    use assert_matches::assert_matches;
    use std::io::Write;

    fn write_csv(dir: &tempfile::TempDir, contents: &str) -> std::path::PathBuf {
        let path = dir.path().join(DEFAULT_IDENTITY_FILE);
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        path
    }

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_sheet_title() {
        assert_eq!(sheet_title("PGE383-F24"), "PGE383-F24 Github Names");
    }

    #[test]
    fn test_load_local_lowercases_both_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(&dir, "EID,Github Username\nJD123,JaneDoe\nab456,johnDOE\n");

        let mapping = IdentityMapLoader::load_local(&path).unwrap();
        assert_eq!(mapping.len(), 2);
        assert_eq!(mapping.lookup("janedoe"), Some("jd123"));
        assert_eq!(mapping.lookup("JOHNDOE"), Some("ab456"));
        assert_eq!(mapping.source(), &IdentitySource::LocalFile(path));
    }

    #[test]
    fn test_load_local_ignores_extra_columns_and_blank_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(
            &dir,
            "Name,Github Username,EID\nJane Doe, janedoe , jd123\n,,\nNo Handle,,xx999\n",
        );

        let mapping = IdentityMapLoader::load_local(&path).unwrap();
        assert_eq!(mapping.len(), 1);
        assert_eq!(mapping.lookup("janedoe"), Some("jd123"));
    }

    #[test]
    fn test_load_local_missing_column_is_format_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(&dir, "EID,Username\njd123,janedoe\n");
        assert_matches!(IdentityMapLoader::load_local(&path), Err(Error::Format(_)));
    }

    #[test]
    fn test_mapping_from_rows_short_rows_skipped() {
        let mapping = mapping_from_rows(
            IdentitySource::Unavailable,
            &headers(&["EID", "Github Username"]),
            vec![vec!["jd123".to_string()], vec!["ab456".to_string(), "JohnDoe".to_string()]],
        )
        .unwrap();
        assert_eq!(mapping.len(), 1);
        assert_eq!(mapping.lookup("johndoe"), Some("ab456"));
    }

    #[tokio::test]
    async fn test_load_without_any_source_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join(DEFAULT_IDENTITY_FILE);

        let mapping = IdentityMapLoader::load::<MemorySpreadsheet>(&missing, None).await;
        assert!(mapping.is_empty());
        assert_eq!(mapping.source(), &IdentitySource::Unavailable);
    }

    #[tokio::test]
    async fn test_load_remote_requires_both_settings() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join(DEFAULT_IDENTITY_FILE);
        let sheets = MemorySpreadsheet::new();

        let remote = RemoteIdentitySource {
            service: &sheets,
            encoded_credentials: None,
            collection_name: Some("course"),
        };
        let mapping = IdentityMapLoader::load(&missing, Some(remote)).await;
        assert_eq!(mapping.source(), &IdentitySource::Unavailable);
        assert!(sheets.requested_sheets().is_empty());
    }

    #[tokio::test]
    async fn test_load_remote_malformed_credentials_degrades() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join(DEFAULT_IDENTITY_FILE);
        let sheets = MemorySpreadsheet::new();

        let remote = RemoteIdentitySource {
            service: &sheets,
            encoded_credentials: Some("%%%not-base64%%%"),
            collection_name: Some("course"),
        };
        let mapping = IdentityMapLoader::load(&missing, Some(remote)).await;
        assert!(mapping.is_empty());
        assert_eq!(mapping.source(), &IdentitySource::Unavailable);
    }

    #[tokio::test]
    async fn test_malformed_local_file_does_not_fall_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(&dir, "Username\njanedoe\n");
        let sheets = MemorySpreadsheet::new().with_sheet(
            "course Github Names",
            vec![
                vec!["EID".into(), "Github Username".into()],
                vec!["jd123".into(), "janedoe".into()],
            ],
        );
        let token = crate::fakes::service_account_token();

        let remote = RemoteIdentitySource {
            service: &sheets,
            encoded_credentials: Some(&token),
            collection_name: Some("course"),
        };
        let mapping = IdentityMapLoader::load(&path, Some(remote)).await;
        assert!(mapping.is_empty());
        assert!(sheets.requested_sheets().is_empty());
    }
}

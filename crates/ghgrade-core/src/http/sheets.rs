//! Google Sheets client authenticated as a service account
//!
//! Opening a spreadsheet by title takes three calls: the Drive API resolves
//! the title to a spreadsheet ID, the Sheets API names the first worksheet,
//! and a values request reads its rows.

use crate::credentials::ServiceAccountKey;
use crate::error::{Error, Result};
use crate::http::{build_client, check_status};
use crate::traits::SpreadsheetService;
use serde::{Deserialize, Serialize};
use std::future::Future;

/// Drive v3 endpoint
pub const DEFAULT_DRIVE_URL: &str = "https://www.googleapis.com/drive/v3";

/// Sheets v4 endpoint
pub const DEFAULT_SHEETS_URL: &str = "https://sheets.googleapis.com/v4";

const SCOPES: &str =
    "https://www.googleapis.com/auth/spreadsheets.readonly https://www.googleapis.com/auth/drive.readonly";

const ASSERTION_LIFETIME_SECS: i64 = 3600;

#[derive(Serialize)]
struct JwtClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct DriveFileList {
    #[serde(default)]
    files: Vec<DriveFile>,
}

#[derive(Debug, Deserialize)]
struct DriveFile {
    id: String,
}

#[derive(Debug, Deserialize)]
struct SpreadsheetMeta {
    #[serde(default)]
    sheets: Vec<SheetEntry>,
}

#[derive(Debug, Deserialize)]
struct SheetEntry {
    properties: SheetProperties,
}

#[derive(Debug, Deserialize)]
struct SheetProperties {
    title: String,
}

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<serde_json::Value>>,
}

/// Render a cell as text. Formatted values arrive as strings already.
fn cell_text(value: serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s,
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Quote a title for a Drive `q` expression
fn drive_query(title: &str) -> String {
    let escaped = title.replace('\\', "\\\\").replace('\'', "\\'");
    format!(
        "name = '{}' and mimeType = 'application/vnd.google-apps.spreadsheet' and trashed = false",
        escaped
    )
}

/// A1 range covering a whole worksheet
fn sheet_range(title: &str) -> String {
    format!("'{}'", title.replace('\'', "''"))
}

/// Google Sheets reader
#[derive(Debug)]
pub struct GoogleSheetsClient {
    client: reqwest::Client,
    drive_url: String,
    sheets_url: String,
}

impl Default for GoogleSheetsClient {
    fn default() -> Self {
        Self::new()
    }
}

impl GoogleSheetsClient {
    /// Client for the public Google endpoints
    pub fn new() -> Self {
        Self::with_endpoints(DEFAULT_DRIVE_URL, DEFAULT_SHEETS_URL)
    }

    /// Client for custom Drive and Sheets endpoints
    pub fn with_endpoints(drive_url: impl Into<String>, sheets_url: impl Into<String>) -> Self {
        Self {
            client: build_client(),
            drive_url: drive_url.into().trim_end_matches('/').to_string(),
            sheets_url: sheets_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Exchange a signed service-account assertion for an access token
    async fn access_token(&self, credentials: &ServiceAccountKey) -> Result<String> {
        let key = jsonwebtoken::EncodingKey::from_rsa_pem(credentials.private_key.as_bytes())
            .map_err(|e| Error::Format(format!("Service-account private key is invalid: {}", e)))?;

        let iat = chrono::Utc::now().timestamp();
        let claims = JwtClaims {
            iss: &credentials.client_email,
            scope: SCOPES,
            aud: &credentials.token_uri,
            iat,
            exp: iat + ASSERTION_LIFETIME_SECS,
        };
        let assertion = jsonwebtoken::encode(
            &jsonwebtoken::Header::new(jsonwebtoken::Algorithm::RS256),
            &claims,
            &key,
        )
        .map_err(|e| Error::Format(format!("Failed to sign service-account assertion: {}", e)))?;

        let response = self
            .client
            .post(&credentials.token_uri)
            .form(&[
                ("grant_type", "urn:ietf:params:oauth:grant-type:jwt-bearer"),
                ("assertion", assertion.as_str()),
            ])
            .send()
            .await
            .map_err(|e| Error::Http(format!("Failed to request access token: {}", e)))?;
        let response = check_status(response, "Service-account token exchange")?;

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| Error::Format(format!("Failed to parse token response: {}", e)))?;
        Ok(token.access_token)
    }

    async fn find_spreadsheet_id(&self, access_token: &str, title: &str) -> Result<String> {
        let url = format!("{}/files", self.drive_url);
        let response = self
            .client
            .get(&url)
            .bearer_auth(access_token)
            .query(&[
                ("q", drive_query(title).as_str()),
                ("fields", "files(id,name)"),
                ("supportsAllDrives", "true"),
                ("includeItemsFromAllDrives", "true"),
            ])
            .send()
            .await
            .map_err(|e| Error::Http(format!("Failed to search Drive: {}", e)))?;
        let response = check_status(response, &format!("Searching Drive for '{}'", title))?;

        let list: DriveFileList = response
            .json()
            .await
            .map_err(|e| Error::Format(format!("Failed to parse Drive file list: {}", e)))?;

        list.files
            .into_iter()
            .next()
            .map(|f| f.id)
            .ok_or_else(|| Error::NotFound(format!("Spreadsheet '{}' not found", title)))
    }

    async fn first_sheet_title(&self, access_token: &str, spreadsheet_id: &str) -> Result<String> {
        let url = format!("{}/spreadsheets/{}", self.sheets_url, spreadsheet_id);
        let response = self
            .client
            .get(&url)
            .bearer_auth(access_token)
            .query(&[("fields", "sheets.properties.title")])
            .send()
            .await
            .map_err(|e| Error::Http(format!("Failed to open spreadsheet: {}", e)))?;
        let response = check_status(response, "Opening spreadsheet")?;

        let meta: SpreadsheetMeta = response
            .json()
            .await
            .map_err(|e| Error::Format(format!("Failed to parse spreadsheet metadata: {}", e)))?;

        meta.sheets
            .into_iter()
            .next()
            .map(|s| s.properties.title)
            .ok_or_else(|| Error::NotFound("Spreadsheet has no worksheets".to_string()))
    }

    async fn sheet_values(
        &self,
        access_token: &str,
        spreadsheet_id: &str,
        sheet_title: &str,
    ) -> Result<Vec<Vec<String>>> {
        let mut url = reqwest::Url::parse(&format!(
            "{}/spreadsheets/{}/values",
            self.sheets_url, spreadsheet_id
        ))
        .map_err(|e| Error::Config(format!("Invalid Sheets URL: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| Error::Config("Sheets URL cannot be a base".to_string()))?
            .push(&sheet_range(sheet_title));

        let response = self
            .client
            .get(url)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| Error::Http(format!("Failed to read worksheet: {}", e)))?;
        let response = check_status(response, &format!("Reading worksheet '{}'", sheet_title))?;

        let range: ValueRange = response
            .json()
            .await
            .map_err(|e| Error::Format(format!("Failed to parse worksheet values: {}", e)))?;

        Ok(range
            .values
            .into_iter()
            .map(|row| row.into_iter().map(cell_text).collect())
            .collect())
    }
}

impl SpreadsheetService for GoogleSheetsClient {
    fn read_rows<'a>(
        &'a self,
        credentials: &'a ServiceAccountKey,
        spreadsheet_name: &'a str,
    ) -> impl Future<Output = Result<Vec<Vec<String>>>> + Send + 'a {
        async move {
            let token = self.access_token(credentials).await?;
            let id = self.find_spreadsheet_id(&token, spreadsheet_name).await?;
            let title = self.first_sheet_title(&token, &id).await?;
            tracing::debug!(spreadsheet = spreadsheet_name, worksheet = %title, "reading worksheet");
            self.sheet_values(&token, &id, &title).await
        }
    }
}

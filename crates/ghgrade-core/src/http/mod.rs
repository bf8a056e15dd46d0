//! HTTP clients for GitHub, Canvas and Google Sheets

pub mod canvas;
pub mod github;
pub mod sheets;

pub use canvas::CanvasApiClient;
pub use github::GitHubApiClient;
pub use sheets::GoogleSheetsClient;

use crate::error::{Error, Result};

/// User agent sent with every request
pub(crate) const USER_AGENT: &str = concat!("ghgrade/", env!("CARGO_PKG_VERSION"));

/// Build the shared reqwest client
pub(crate) fn build_client() -> reqwest::Client {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(std::time::Duration::from_secs(30))
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}

/// Map a non-success response to an error.
///
/// 404 becomes `NotFound`, a 403/429 with an exhausted rate limit becomes
/// `RateLimitExceeded`, anything else `Api`.
pub(crate) fn check_status(response: reqwest::Response, what: &str) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    if status == reqwest::StatusCode::NOT_FOUND {
        return Err(Error::NotFound(format!("{} (404)", what)));
    }

    if status == reqwest::StatusCode::FORBIDDEN || status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        let remaining = response
            .headers()
            .get("x-ratelimit-remaining")
            .and_then(|v| v.to_str().ok());

        if remaining == Some("0") || status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(Error::RateLimitExceeded(format!(
                "{}: rate limit exceeded, remaining: {}",
                what,
                remaining.unwrap_or("unknown")
            )));
        }
    }

    Err(Error::Api {
        status: status.as_u16(),
        message: format!("{} failed", what),
    })
}

/// True when a `Link` header advertises a next page
pub(crate) fn has_next_page(headers: &reqwest::header::HeaderMap) -> bool {
    headers
        .get(reqwest::header::LINK)
        .and_then(|v| v.to_str().ok())
        .map(|link| link.contains("rel=\"next\""))
        .unwrap_or(false)
}

//! Error types for ghgrade-core

/// Result type alias for grading operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for grading operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Missing or invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// A lookup found no record (assignment, runs, identity, gradebook user)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Malformed input (credential token, identity file, timestamp, due date)
    #[error("Format error: {0}")]
    Format(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Transport-level HTTP failure
    #[error("HTTP error: {0}")]
    Http(String),

    /// Non-success status returned by an external API
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Description of the failed call
        message: String,
    },

    /// API rate limit exceeded
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    /// Other errors
    #[error("Error: {0}")]
    Other(String),
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        // reqwest errors carry the URL but never request headers
        Error::Http(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Format(format!("JSON error: {}", err))
    }
}

impl From<csv::Error> for Error {
    fn from(err: csv::Error) -> Self {
        Error::Format(format!("CSV error: {}", err))
    }
}

/// Fieldless error category for cheap pattern matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ErrorKind {
    /// Configuration error
    Config,
    /// Lookup found nothing
    NotFound,
    /// Malformed input
    Format,
    /// I/O operation error
    Io,
    /// HTTP transport error
    Http,
    /// External API returned an error status
    Api,
    /// API rate limit exceeded
    RateLimitExceeded,
    /// Other errors
    Other,
}

impl Error {
    /// Get the error kind.
    #[inline]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Error::Config(_) => ErrorKind::Config,
            Error::NotFound(_) => ErrorKind::NotFound,
            Error::Format(_) => ErrorKind::Format,
            Error::Io(_) => ErrorKind::Io,
            Error::Http(_) => ErrorKind::Http,
            Error::Api { .. } => ErrorKind::Api,
            Error::RateLimitExceeded(_) => ErrorKind::RateLimitExceeded,
            Error::Other(_) => ErrorKind::Other,
        }
    }

    /// Borrow the error message.
    #[inline]
    pub fn message(&self) -> &str {
        match self {
            Error::Config(msg)
            | Error::NotFound(msg)
            | Error::Format(msg)
            | Error::Http(msg)
            | Error::RateLimitExceeded(msg)
            | Error::Other(msg) => msg,
            Error::Api { message, .. } => message,
            Error::Io(_) => "I/O error",
        }
    }

    /// True for lookups that came back empty. The batch reports these as skips.
    #[inline]
    pub const fn is_not_found(&self) -> bool {
        matches!(self.kind(), ErrorKind::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kind_is_copy() {
        let err = Error::NotFound("eid".to_string());
        let k = err.kind();
        let k2 = k;
        assert_eq!(k, k2);
        assert_eq!(std::mem::size_of::<ErrorKind>(), 1);
    }

    #[test]
    fn test_error_message_borrows() {
        let err = Error::Config("GH_TOKEN not set".to_string());
        assert_eq!(err.message(), "GH_TOKEN not set");

        let err = Error::Api {
            status: 403,
            message: "forbidden".to_string(),
        };
        assert_eq!(err.message(), "forbidden");
        assert_eq!(err.to_string(), "API error (403): forbidden");
    }

    #[test]
    fn test_all_error_variants_have_kind() {
        let cases: Vec<(Error, ErrorKind)> = vec![
            (Error::Config("c".into()), ErrorKind::Config),
            (Error::NotFound("n".into()), ErrorKind::NotFound),
            (Error::Format("f".into()), ErrorKind::Format),
            (Error::Io(std::io::Error::other("io")), ErrorKind::Io),
            (Error::Http("h".into()), ErrorKind::Http),
            (
                Error::Api {
                    status: 500,
                    message: "a".into(),
                },
                ErrorKind::Api,
            ),
            (
                Error::RateLimitExceeded("rl".into()),
                ErrorKind::RateLimitExceeded,
            ),
            (Error::Other("o".into()), ErrorKind::Other),
        ];

        for (err, expected_kind) in cases {
            assert_eq!(err.kind(), expected_kind, "Mismatch for {:?}", err);
        }
    }

    #[test]
    fn test_only_not_found_is_skip() {
        assert!(Error::NotFound("x".into()).is_not_found());
        assert!(!Error::Http("x".into()).is_not_found());
        assert!(!Error::Format("x".into()).is_not_found());
    }

    #[test]
    fn test_io_error_converts() {
        let err: Error = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
        assert_eq!(err.kind(), ErrorKind::Io);
        assert!(err.to_string().contains("gone"));
    }
}

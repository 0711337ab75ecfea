//! Error types for the scraper library.

use reqwest::StatusCode;

/// Errors raised while fetching a page or document.
#[derive(thiserror::Error, Debug)]
pub enum FetchError {
    /// Transport-level failure from the HTTP client (timeout, connect, reset).
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    /// The source answered with a non-success status.
    #[error("unexpected status {status}")]
    Status { status: StatusCode },
    /// The source appears to be soft-blocking the client: a 403, or a
    /// suspiciously tiny "denied" body on a 200.
    #[error("request blocked by source (status {status}, {body_len} byte body)")]
    Blocked { status: StatusCode, body_len: usize },
    /// The URL could not be parsed or joined.
    #[error("invalid url: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl FetchError {
    /// Whether a retry has any chance of succeeding. Timeouts, connection
    /// failures, 5xx and 429 responses, and soft blocks are transient;
    /// other 4xx statuses and malformed URLs are permanent.
    pub fn is_transient(&self) -> bool {
        match self {
            FetchError::Http(e) => !e.is_builder(),
            FetchError::Status { status } => {
                status.is_server_error() || *status == StatusCode::TOO_MANY_REQUESTS
            }
            FetchError::Blocked { .. } => true,
            FetchError::InvalidUrl(_) => false,
        }
    }
}

/// A failure affecting one fetched page: either the fetch itself or the
/// payload extraction. Contained to that page by every caller.
#[derive(thiserror::Error, Debug)]
pub enum PageError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Extract(#[from] spbe_extract::ExtractError),
}

/// Fatal run-level failures. Partial data is returned with warnings instead;
/// this fires only when a run meant to produce records produced none.
#[derive(thiserror::Error, Debug)]
pub enum RunError {
    #[error("no records could be extracted from any page")]
    NoRecords,
}

/// Errors loading the run configuration.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("cannot read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("cannot parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

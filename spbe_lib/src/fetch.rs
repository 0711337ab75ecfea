//! Page fetching: a pluggable capability behind one trait.
//!
//! The extraction pipeline only ever sees [`PageFetcher`], so the default
//! HTTP client can be swapped for a headless-browser driver (or a test stub)
//! without touching extraction or pagination.

use std::future::Future;
use std::time::Duration;

use reqwest::StatusCode;

use crate::error::FetchError;
use crate::user_agent::get_user_agent;

/// Anything that can turn a URL into page text.
pub trait PageFetcher {
    fn fetch_page(&self, url: &str)
        -> impl Future<Output = Result<String, FetchError>> + Send;
}

/// Default fetcher: reqwest with browser-like headers and a rotating user
/// agent. Gzip and rustls come from the client builder defaults.
pub struct HttpFetcher {
    http: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let http = reqwest::Client::builder()
            .user_agent(get_user_agent())
            .timeout(timeout)
            .build()?;
        Ok(Self { http })
    }
}

impl PageFetcher for HttpFetcher {
    async fn fetch_page(&self, url: &str) -> Result<String, FetchError> {
        let resp = self
            .http
            .get(url)
            .header("accept", "text/html,application/xhtml+xml")
            .header("accept-language", "ru-RU,ru;q=0.9,en-US;q=0.8,en;q=0.7")
            .header("upgrade-insecure-requests", "1")
            .header("cache-control", "no-cache")
            .header("pragma", "no-cache")
            .send()
            .await?;

        let status = resp.status();
        if status == StatusCode::FORBIDDEN {
            return Err(FetchError::Blocked { status, body_len: 0 });
        }
        if !status.is_success() {
            return Err(FetchError::Status { status });
        }

        let body = resp.text().await?;
        if body.len() < 512 && body.to_ascii_lowercase().contains("denied") {
            tracing::warn!(url, body_len = body.len(), "possible soft block");
            return Err(FetchError::Blocked {
                status,
                body_len: body.len(),
            });
        }

        Ok(body)
    }
}

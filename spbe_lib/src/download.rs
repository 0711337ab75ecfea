//! Resilient document downloads: retry with backoff, skip-if-present,
//! bounded concurrency, atomic writes.
//!
//! One task's failure never blocks the rest of the batch; every task ends in
//! exactly one [`DownloadOutcome`] that the run summary aggregates.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use reqwest::StatusCode;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use url::Url;

use crate::config::RunConfig;
use crate::documents::DocumentLink;
use crate::error::FetchError;
use crate::sanitize::sanitize_segment;
use crate::user_agent::get_user_agent;

/// One document to fetch for one bond.
#[derive(Clone, Debug)]
pub struct DownloadTask {
    pub issuer: String,
    pub isin: String,
    pub file_url: Url,
    pub dest_dir: PathBuf,
    pub filename: String,
}

impl DownloadTask {
    /// Destination is `<root>/<sanitized issuer>/<sanitized isin>/<filename>`.
    pub fn new(issuer: &str, isin: &str, link: &DocumentLink, prospectuses_root: &Path) -> Self {
        let dest_dir = prospectuses_root
            .join(sanitize_segment(issuer))
            .join(sanitize_segment(isin));
        Self {
            issuer: issuer.to_string(),
            isin: isin.to_string(),
            file_url: link.url.clone(),
            dest_dir,
            filename: link.filename.clone(),
        }
    }
}

/// What happened to one task.
#[derive(Debug)]
pub enum DownloadOutcome {
    /// The target file already exists with non-zero size; nothing was fetched.
    Skipped { path: PathBuf },
    Succeeded { path: PathBuf, bytes_written: u64 },
    Failed {
        url: String,
        reason: String,
        attempts: u32,
    },
}

/// Bounded-concurrency downloader with a per-document retry policy.
#[derive(Clone)]
pub struct Downloader {
    http: reqwest::Client,
    max_retries: u32,
    backoff_base: Duration,
    permits: Arc<Semaphore>,
}

impl Downloader {
    pub fn new(cfg: &RunConfig) -> Result<Self, FetchError> {
        let http = reqwest::Client::builder()
            .user_agent(get_user_agent())
            .timeout(cfg.request_timeout())
            .build()?;
        Ok(Self {
            http,
            max_retries: cfg.max_retries.max(1),
            backoff_base: cfg.backoff_base(),
            permits: Arc::new(Semaphore::new(cfg.max_concurrent_downloads.max(1))),
        })
    }

    /// Stops issuing new downloads. Tasks already holding a permit run to
    /// completion; queued ones finish as cancelled failures.
    pub fn shutdown(&self) {
        self.permits.close();
    }

    /// Runs every task through the worker pool and collects all outcomes.
    pub async fn run_all(&self, tasks: Vec<DownloadTask>) -> Vec<DownloadOutcome> {
        let mut set = JoinSet::new();
        for task in tasks {
            let worker = self.clone();
            set.spawn(async move { worker.download(&task).await });
        }

        let mut outcomes = Vec::new();
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok(outcome) => outcomes.push(outcome),
                Err(err) => tracing::error!(error = %err, "download worker panicked"),
            }
        }
        outcomes
    }

    /// Downloads one document, honoring the concurrency cap, skip-if-present,
    /// and the retry policy.
    pub async fn download(&self, task: &DownloadTask) -> DownloadOutcome {
        let _permit = match self.permits.acquire().await {
            Ok(permit) => permit,
            Err(_) => {
                return DownloadOutcome::Failed {
                    url: task.file_url.to_string(),
                    reason: "cancelled before start".to_string(),
                    attempts: 0,
                }
            }
        };

        let dest = task.dest_dir.join(&task.filename);

        // "already downloaded" means the file exists and is non-empty
        if let Ok(meta) = tokio::fs::metadata(&dest).await {
            if meta.is_file() && meta.len() > 0 {
                tracing::debug!(path = %dest.display(), "already present, skipping");
                return DownloadOutcome::Skipped { path: dest };
            }
        }

        if let Err(err) = tokio::fs::create_dir_all(&task.dest_dir).await {
            return DownloadOutcome::Failed {
                url: task.file_url.to_string(),
                reason: format!("cannot create {}: {}", task.dest_dir.display(), err),
                attempts: 0,
            };
        }

        let mut attempt = 0u32;
        loop {
            attempt += 1;
            match self.fetch_bytes(task.file_url.as_str()).await {
                Ok(bytes) => {
                    return match write_atomic(&dest, &bytes).await {
                        Ok(written) => {
                            tracing::info!(
                                path = %dest.display(),
                                bytes = written,
                                "downloaded"
                            );
                            DownloadOutcome::Succeeded {
                                path: dest,
                                bytes_written: written,
                            }
                        }
                        Err(err) => DownloadOutcome::Failed {
                            url: task.file_url.to_string(),
                            reason: format!("write failed: {}", err),
                            attempts: attempt,
                        },
                    };
                }
                Err(err) => {
                    if !err.is_transient() || attempt >= self.max_retries {
                        return DownloadOutcome::Failed {
                            url: task.file_url.to_string(),
                            reason: err.to_string(),
                            attempts: attempt,
                        };
                    }
                    let delay = self.backoff_delay(attempt);
                    tracing::warn!(
                        url = %task.file_url,
                        attempt,
                        max = self.max_retries,
                        delay_ms = delay.as_millis() as u64,
                        "download failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let resp = self
            .http
            .get(url)
            .header("accept", "*/*")
            .send()
            .await?;
        let status = resp.status();
        if status == StatusCode::FORBIDDEN {
            return Err(FetchError::Blocked { status, body_len: 0 });
        }
        if !status.is_success() {
            return Err(FetchError::Status { status });
        }
        Ok(resp.bytes().await?.to_vec())
    }

    /// Doubles per attempt from the configured base, with jitter narrow
    /// enough that consecutive delays stay strictly increasing.
    fn backoff_delay(&self, attempt: u32) -> Duration {
        let shift = attempt.saturating_sub(1).min(20);
        let scaled = (self.backoff_base.as_millis() as u64).saturating_mul(1u64 << shift);
        let jitter = rand::thread_rng().gen_range(0.8..1.2);
        Duration::from_millis((scaled as f64 * jitter) as u64)
    }
}

/// Writes to `<name>.part`, then renames into place, so an interrupted run
/// never leaves a partial file under the final name.
async fn write_atomic(dest: &Path, bytes: &[u8]) -> std::io::Result<u64> {
    let mut tmp_name = dest.as_os_str().to_owned();
    tmp_name.push(".part");
    let tmp = PathBuf::from(tmp_name);
    tokio::fs::write(&tmp, bytes).await?;
    tokio::fs::rename(&tmp, dest).await?;
    Ok(bytes.len() as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn downloader(base_ms: u64) -> Downloader {
        Downloader {
            http: reqwest::Client::new(),
            max_retries: 3,
            backoff_base: Duration::from_millis(base_ms),
            permits: Arc::new(Semaphore::new(2)),
        }
    }

    #[test]
    fn backoff_delays_strictly_increase() {
        // worst-case jitter still satisfies 1.2 * 2^(n-1) < 0.8 * 2^n
        let d = downloader(100);
        for _ in 0..20 {
            let first = d.backoff_delay(1);
            let second = d.backoff_delay(2);
            let third = d.backoff_delay(3);
            assert!(first < second, "{:?} !< {:?}", first, second);
            assert!(second < third, "{:?} !< {:?}", second, third);
        }
    }

    #[test]
    fn backoff_shift_is_capped() {
        let d = downloader(100);
        // must not overflow for absurd attempt numbers
        let _ = d.backoff_delay(u32::MAX);
    }

    #[test]
    fn task_paths_are_sanitized() {
        let link = DocumentLink {
            url: Url::parse("https://spbexchange.ru/docs/prospekt.pdf").unwrap(),
            filename: "prospekt.pdf".to_string(),
        };
        let task = DownloadTask::new(
            "ООО \"Рога и Копыта\"/Test",
            "RU000A0JX0J2",
            &link,
            Path::new("/tmp/prospectuses"),
        );
        let dir = task.dest_dir.to_string_lossy().into_owned();
        assert!(!dir["/tmp/prospectuses".len()..].contains('"'));
        assert!(dir.ends_with("RU000A0JX0J2"));
    }
}

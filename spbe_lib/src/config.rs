//! Run configuration: every tunable the pipelines consume.
//!
//! Defaults are compiled in, a TOML file can override them, and the retry
//! knobs can additionally be tuned through environment variables. The config
//! is passed explicitly into the paginator and downloader at construction;
//! nothing here is ambient global state.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;

/// Tunables for one scraper run.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Root of the listing site.
    pub base_url: String,
    /// Root of the issuer-disclosure site.
    pub issuers_url: String,
    /// Records requested per listing page.
    pub page_size: u32,
    /// Safety cap on pages fetched in one pagination sequence.
    pub max_pages: u32,
    /// Per-request timeout, seconds.
    pub request_timeout_secs: u64,
    /// Download attempts per document before giving up.
    pub max_retries: u32,
    /// First backoff delay, milliseconds; doubles per attempt.
    pub backoff_base_ms: u64,
    /// Minimum pause between consecutive page fetches, milliseconds.
    pub inter_page_delay_ms: u64,
    /// Cap on concurrent in-flight document downloads.
    pub max_concurrent_downloads: usize,
    /// Root for all outputs (reference data CSV lands here).
    pub output_dir: PathBuf,
    /// Directory name for downloaded documents, under `output_dir`.
    pub prospectuses_dir: String,
    /// Also request listings of previously cancelled issues.
    pub include_cancelled: bool,
    /// Remap a canonical field to a different source key.
    pub field_overrides: Vec<FieldOverride>,
    /// Source-language markers translated to "Yes".
    pub boolean_yes_markers: Vec<String>,
    /// Source-language markers translated to "No".
    pub boolean_no_markers: Vec<String>,
}

/// One field-mapping override: canonical output field name to source key.
#[derive(Clone, Debug, Deserialize)]
pub struct FieldOverride {
    pub canonical: String,
    pub source: String,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            base_url: "https://spbexchange.ru".to_string(),
            issuers_url: "https://issuers.spbexchange.ru".to_string(),
            page_size: 100,
            max_pages: 200,
            request_timeout_secs: 30,
            max_retries: 3,
            backoff_base_ms: 2000,
            inter_page_delay_ms: 1000,
            max_concurrent_downloads: 3,
            output_dir: PathBuf::from("output"),
            prospectuses_dir: "Prospectuses".to_string(),
            include_cancelled: false,
            field_overrides: Vec::new(),
            boolean_yes_markers: default_yes_markers(),
            boolean_no_markers: default_no_markers(),
        }
    }
}

fn default_yes_markers() -> Vec<String> {
    ["да", "предусмотрена", "предусмотрено", "есть"]
        .into_iter()
        .map(str::to_string)
        .collect()
}

fn default_no_markers() -> Vec<String> {
    ["нет", "не предусмотрена", "не предусмотрено", "отсутствует"]
        .into_iter()
        .map(str::to_string)
        .collect()
}

impl RunConfig {
    /// Loads configuration from a TOML file, then applies env overrides.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        let mut cfg: RunConfig = toml::from_str(&text)?;
        cfg.apply_env();
        Ok(cfg)
    }

    /// Compiled-in defaults with env overrides applied.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        cfg.apply_env();
        cfg
    }

    /// Env overrides for the retry/pacing knobs, highest precedence.
    pub fn apply_env(&mut self) {
        self.max_retries = env_u64("SPBE_RETRY_MAX", u64::from(self.max_retries)) as u32;
        self.backoff_base_ms = env_u64("SPBE_RETRY_BASE_MS", self.backoff_base_ms);
        self.inter_page_delay_ms =
            env_u64("SPBE_INTER_PAGE_DELAY_MS", self.inter_page_delay_ms);
        if let Ok(url) = std::env::var("SPBE_BASE_URL") {
            if !url.is_empty() {
                self.base_url = url.trim_end_matches('/').to_string();
            }
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn backoff_base(&self) -> Duration {
        Duration::from_millis(self.backoff_base_ms)
    }

    pub fn inter_page_delay(&self) -> Duration {
        Duration::from_millis(self.inter_page_delay_ms)
    }

    /// Absolute directory documents are downloaded into.
    pub fn prospectuses_root(&self) -> PathBuf {
        self.output_dir.join(&self.prospectuses_dir)
    }

    /// Listing-endpoint URL for a 0-based page index, filtered to bonds
    /// server-side the way the site's own frontend does.
    pub fn listing_page_url(&self, page: u32) -> String {
        let mut url = format!(
            "{}/listing/securities/list/?page={}&size={}&sortBy=securityKind&sortByDirection=desc&securityKind=%D0%9E%D0%B1%D0%BB%D0%B8%D0%B3%D0%B0%D1%86%D0%B8%D0%B8",
            self.base_url, page, self.page_size
        );
        if self.include_cancelled {
            url.push_str("&showAnnulled=true");
        }
        url
    }

    /// Detail-page URL for one security code.
    pub fn detail_page_url(&self, security_code: &str) -> String {
        format!("{}/listing/securities/{}/", self.base_url, security_code)
    }
}

fn env_u64(name: &str, default: u64) -> u64 {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let cfg = RunConfig::default();
        assert_eq!(cfg.max_retries, 3);
        assert_eq!(cfg.page_size, 100);
        assert!(cfg.listing_page_url(0).contains("page=0"));
        assert!(cfg.listing_page_url(2).contains("page=2"));
        assert!(!cfg.listing_page_url(0).contains("showAnnulled"));
    }

    #[test]
    fn cancelled_flag_changes_listing_url() {
        let cfg = RunConfig {
            include_cancelled: true,
            ..RunConfig::default()
        };
        assert!(cfg.listing_page_url(0).contains("showAnnulled=true"));
    }

    #[test]
    fn toml_overrides_defaults() {
        let cfg: RunConfig = toml::from_str(
            r#"
            page_size = 50
            inter_page_delay_ms = 250
            boolean_yes_markers = ["да"]
            [[field_overrides]]
            canonical = "ISIN"
            source = "isinCode"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.page_size, 50);
        assert_eq!(cfg.inter_page_delay_ms, 250);
        assert_eq!(cfg.max_retries, 3);
        assert_eq!(cfg.field_overrides.len(), 1);
        assert_eq!(cfg.boolean_yes_markers, vec!["да".to_string()]);
    }
}

//! End-of-run accounting: what was extracted, skipped, and downloaded.

use std::fmt;

use crate::download::DownloadOutcome;
use crate::paginate::PageFailure;

/// One download that exhausted its attempts or failed permanently.
#[derive(Debug)]
pub struct FailedDownload {
    pub url: String,
    pub reason: String,
    pub attempts: u32,
}

/// Aggregated results of one run, assembled from per-task outcomes after the
/// workers have joined, so no shared counters are mutated concurrently.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub records_extracted: usize,
    pub records_dropped: usize,
    pub detail_pages_failed: usize,
    pub pages_skipped: Vec<PageFailure>,
    pub downloads_skipped: usize,
    pub downloads_succeeded: usize,
    pub downloads_failed: Vec<FailedDownload>,
}

impl RunSummary {
    pub fn absorb_outcomes(&mut self, outcomes: Vec<DownloadOutcome>) {
        for outcome in outcomes {
            match outcome {
                DownloadOutcome::Skipped { .. } => self.downloads_skipped += 1,
                DownloadOutcome::Succeeded { .. } => self.downloads_succeeded += 1,
                DownloadOutcome::Failed {
                    url,
                    reason,
                    attempts,
                } => self.downloads_failed.push(FailedDownload {
                    url,
                    reason,
                    attempts,
                }),
            }
        }
    }

    /// True when anything at all went wrong, for the operator's exit banner.
    pub fn has_warnings(&self) -> bool {
        self.records_dropped > 0
            || self.detail_pages_failed > 0
            || !self.pages_skipped.is_empty()
            || !self.downloads_failed.is_empty()
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "records extracted: {}", self.records_extracted)?;
        writeln!(f, "records dropped:   {}", self.records_dropped)?;
        writeln!(f, "pages skipped:     {}", self.pages_skipped.len())?;
        writeln!(f, "detail pages failed: {}", self.detail_pages_failed)?;
        writeln!(
            f,
            "downloads: {} new, {} skipped, {} failed",
            self.downloads_succeeded,
            self.downloads_skipped,
            self.downloads_failed.len()
        )?;
        for failure in &self.pages_skipped {
            writeln!(f, "  page {}: {}", failure.page, failure.reason)?;
        }
        for failure in &self.downloads_failed {
            writeln!(
                f,
                "  {} failed after {} attempt(s): {}",
                failure.url, failure.attempts, failure.reason
            )?;
        }
        Ok(())
    }
}

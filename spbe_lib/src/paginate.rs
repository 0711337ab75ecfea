//! Sequential pagination over a listing endpoint.
//!
//! Pages are fetched strictly in order: the source does not guarantee that
//! consecutive pages are independent under concurrent access, and early-stop
//! correctness depends on seeing the envelope before over-fetching. A failed
//! page is skipped and reported, never fatal to the sequence.

use std::time::Duration;

use spbe_extract::{locate_payload, ExtractionResult, RawRecord};

use crate::error::PageError;
use crate::fetch::PageFetcher;

/// One page that contributed nothing, kept for the run summary.
/// `page` is 1-based for operator-facing reporting.
#[derive(Debug)]
pub struct PageFailure {
    pub page: u32,
    pub reason: String,
}

/// The merged outcome of one pagination sequence.
#[derive(Debug)]
pub struct PageSet {
    pub records: Vec<RawRecord>,
    pub failures: Vec<PageFailure>,
    /// `totalElements` from the envelope, when one was present.
    pub expected_total: Option<u64>,
}

impl PageSet {
    /// True when the source promised more records than were merged.
    pub fn is_incomplete(&self) -> bool {
        self.expected_total
            .map(|total| (self.records.len() as u64) < total)
            .unwrap_or(false)
    }
}

pub struct Paginator {
    inter_page_delay: Duration,
    max_pages: u32,
}

impl Paginator {
    pub fn new(inter_page_delay: Duration, max_pages: u32) -> Self {
        Self {
            inter_page_delay,
            max_pages,
        }
    }

    /// Fetches and merges every page of one listing. `page_url` builds the
    /// fetch URL for a 0-based page index.
    pub async fn collect<F, U>(&self, fetcher: &F, page_url: U) -> PageSet
    where
        F: PageFetcher,
        U: Fn(u32) -> String,
    {
        let mut records: Vec<RawRecord> = Vec::new();
        let mut failures: Vec<PageFailure> = Vec::new();
        let mut expected_total: Option<u64> = None;
        let mut total_pages: u32 = 1;
        let mut page: u32 = 0;

        loop {
            if page > 0 {
                tokio::time::sleep(self.inter_page_delay).await;
            }
            let url = page_url(page);
            match self.fetch_one(fetcher, &url).await {
                Ok(result) => {
                    let envelope = result.pagination;
                    let count = result.records.len();
                    records.extend(result.records);
                    tracing::info!(
                        page = page + 1,
                        records = count,
                        total = records.len(),
                        "page merged"
                    );
                    match envelope {
                        Some(info) => {
                            total_pages = info.total_pages;
                            expected_total = Some(info.total_elements);
                        }
                        // no envelope on the first page: single-page result
                        None if page == 0 => break,
                        None => {}
                    }
                }
                Err(err) => {
                    tracing::warn!(page = page + 1, error = %err, "page skipped");
                    failures.push(PageFailure {
                        page: page + 1,
                        reason: err.to_string(),
                    });
                }
            }

            if let Some(total) = expected_total {
                if records.len() as u64 >= total {
                    break;
                }
            }
            page += 1;
            if page >= total_pages || page >= self.max_pages {
                break;
            }
        }

        let set = PageSet {
            records,
            failures,
            expected_total,
        };
        if set.is_incomplete() {
            tracing::warn!(
                merged = set.records.len(),
                expected = set.expected_total.unwrap_or(0),
                "pagination incomplete; continuing with partial set"
            );
        }
        set
    }

    async fn fetch_one<F: PageFetcher>(
        &self,
        fetcher: &F,
        url: &str,
    ) -> Result<ExtractionResult, PageError> {
        let page = fetcher.fetch_page(url).await?;
        Ok(locate_payload(&page)?)
    }
}

//! The reference-data pipeline: listing pages, per-bond detail enrichment,
//! and normalization into canonical records.
//!
//! Listing pages carry a thin record per security; the detail page carries
//! the rest. Detail fields win on key collision. A failed detail fetch
//! degrades that bond to its listing fields, a warning rather than a dropped
//! record.

use std::collections::HashSet;
use std::path::Path;

use serde_json::Value;
use url::Url;

use spbe_extract::{locate_detail_record, RawRecord};

use crate::config::RunConfig;
use crate::documents::{collect_document_links, find_isin, DocumentLink};
use crate::download::DownloadTask;
use crate::error::RunError;
use crate::fetch::PageFetcher;
use crate::mapping::FieldMapper;
use crate::paginate::{PageFailure, Paginator};
use crate::schema::BondRecord;

/// One bond with its discovered disclosure documents.
#[derive(Debug)]
pub struct CollectedBond {
    pub record: BondRecord,
    pub documents: Vec<DocumentLink>,
}

/// Everything one collection pass produced.
#[derive(Debug)]
pub struct Harvest {
    pub bonds: Vec<CollectedBond>,
    pub page_failures: Vec<PageFailure>,
    /// Bonds whose detail page could not be fetched or parsed.
    pub detail_failures: usize,
    /// Records dropped for a missing or duplicate ISIN.
    pub dropped: usize,
}

pub struct ReferenceDataRun<'a> {
    cfg: &'a RunConfig,
    mapper: FieldMapper,
    paginator: Paginator,
}

impl<'a> ReferenceDataRun<'a> {
    pub fn new(cfg: &'a RunConfig) -> Self {
        Self {
            cfg,
            mapper: FieldMapper::new(cfg),
            paginator: Paginator::new(cfg.inter_page_delay(), cfg.max_pages),
        }
    }

    /// Collects, enriches, and normalizes the full bond list. Fails only
    /// when not a single record could be extracted; partial results are
    /// returned with their warnings.
    pub async fn collect<F: PageFetcher>(&self, fetcher: &F) -> Result<Harvest, RunError> {
        let page_set = self
            .paginator
            .collect(fetcher, |page| self.cfg.listing_page_url(page))
            .await;

        if page_set.records.is_empty() {
            return Err(RunError::NoRecords);
        }

        let listed: Vec<RawRecord> = page_set
            .records
            .into_iter()
            .filter(|record| is_bond(record))
            .collect();
        let total = listed.len();
        tracing::info!(bonds = total, "listing collected");

        let mut bonds = Vec::with_capacity(total);
        let mut seen_isins: HashSet<String> = HashSet::new();
        let mut detail_failures = 0usize;
        let mut dropped = 0usize;

        for (i, listing_record) in listed.into_iter().enumerate() {
            let code = string_field(&listing_record, "srtsCode");
            tracing::info!(bond = %code, n = i + 1, total, "processing bond");

            let (merged, documents) = match self.enrich(fetcher, &listing_record, &code).await {
                Some((detail, documents)) => {
                    let mut merged = listing_record;
                    merged.extend(detail);
                    (merged, documents)
                }
                None => {
                    detail_failures += 1;
                    (listing_record, Vec::new())
                }
            };

            let record = self.mapper.map_record(&merged);
            if record.isin().is_empty() {
                tracing::warn!(bond = %code, "record without ISIN dropped");
                dropped += 1;
                continue;
            }
            if !seen_isins.insert(record.isin().to_string()) {
                tracing::warn!(isin = record.isin(), "duplicate ISIN dropped");
                dropped += 1;
                continue;
            }
            bonds.push(CollectedBond { record, documents });
        }

        if bonds.is_empty() {
            return Err(RunError::NoRecords);
        }

        Ok(Harvest {
            bonds,
            page_failures: page_set.failures,
            detail_failures,
            dropped,
        })
    }

    /// Fetches one bond's detail page; returns its fields and document links.
    async fn enrich<F: PageFetcher>(
        &self,
        fetcher: &F,
        listing_record: &RawRecord,
        code: &str,
    ) -> Option<(RawRecord, Vec<DocumentLink>)> {
        if code.is_empty() {
            return None;
        }
        tokio::time::sleep(self.cfg.inter_page_delay()).await;

        let url_text = self.cfg.detail_page_url(code);
        let page = match fetcher.fetch_page(&url_text).await {
            Ok(page) => page,
            Err(err) => {
                tracing::warn!(bond = %code, error = %err, "detail fetch failed");
                return None;
            }
        };
        let mut detail = match locate_detail_record(&page) {
            Ok(detail) => detail,
            Err(err) => {
                tracing::warn!(bond = %code, error = %err, "detail extraction failed");
                return None;
            }
        };

        // document URLs live both in anchors and inside the escaped payload;
        // scanning the normalized text covers both
        let doc_text = spbe_extract::normalize(&page).unwrap_or_else(|_| page.clone());

        // some detail payloads omit the ISIN field but print it in the page body
        if string_field(&detail, "sisinCode").is_empty() {
            if let Some(isin) = find_isin(&doc_text) {
                detail.insert("sisinCode".to_string(), Value::String(isin));
            }
        }

        // a detail payload for a different security would poison the merge
        let listing_isin = string_field(listing_record, "sisinCode");
        let detail_isin = string_field(&detail, "sisinCode");
        if !listing_isin.is_empty() && !detail_isin.is_empty() && listing_isin != detail_isin {
            tracing::warn!(bond = %code, "detail page ISIN mismatch, keeping listing fields");
            return None;
        }

        let documents = match Url::parse(&url_text) {
            Ok(url) => collect_document_links(&url, &doc_text),
            Err(_) => Vec::new(),
        };
        Some((detail, documents))
    }
}

/// Builds one download task per document of every bond.
pub fn document_tasks(bonds: &[CollectedBond], prospectuses_root: &Path) -> Vec<DownloadTask> {
    bonds
        .iter()
        .flat_map(|bond| {
            bond.documents.iter().map(|link| {
                DownloadTask::new(bond.record.issuer(), bond.record.isin(), link, prospectuses_root)
            })
        })
        .collect()
}

fn is_bond(record: &RawRecord) -> bool {
    record
        .get("securityKind")
        .and_then(Value::as_str)
        .map(|kind| kind.contains("Облигац"))
        .unwrap_or(false)
}

fn string_field(record: &RawRecord, key: &str) -> String {
    record
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or("")
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn bond_filter_checks_security_kind() {
        let bond = json!({"securityKind": "Облигации"});
        let share = json!({"securityKind": "Акции"});
        let missing = json!({"srtsCode": "X"});
        assert!(is_bond(bond.as_object().unwrap()));
        assert!(!is_bond(share.as_object().unwrap()));
        assert!(!is_bond(missing.as_object().unwrap()));
    }

    #[test]
    fn tasks_cover_every_document() {
        let record = {
            let mut raw = serde_json::Map::new();
            raw.insert("sisinCode".into(), json!("RU000A0JX0J2"));
            raw.insert("fullName".into(), json!("АО Пример"));
            FieldMapper::new(&RunConfig::default()).map_record(&raw)
        };
        let documents = vec![
            DocumentLink {
                url: Url::parse("https://spbexchange.ru/files/a.pdf").unwrap(),
                filename: "a.pdf".to_string(),
            },
            DocumentLink {
                url: Url::parse("https://spbexchange.ru/files/b.pdf").unwrap(),
                filename: "b.pdf".to_string(),
            },
        ];
        let bonds = vec![CollectedBond { record, documents }];
        let tasks = document_tasks(&bonds, Path::new("/tmp/p"));
        assert_eq!(tasks.len(), 2);
        assert!(tasks[0].dest_dir.ends_with("АО Пример/RU000A0JX0J2"));
    }
}

//! Payload location: ordered strategies over normalized page text.
//!
//! The source guarantees no fixed wrapper shape, so each strategy is a
//! self-contained probe and the list is tried in priority order. Adding a
//! strategy means adding a variant and an arm here; existing probes stay
//! untouched.

use serde_json::Value;

use crate::brackets::{balanced_span, delimiter_after};
use crate::errors::ExtractError;
use crate::normalize::normalize;
use crate::types::{ExtractionResult, PaginationInfo, RawRecord, Strategy};

const PAGE_DATA_KEY: &str = "\"pageData\":";
const CONTENT_KEY: &str = "\"content\":";
const EXCERPT_CHARS: usize = 200;

/// Normalizes `page` and tries each strategy in order. The first one that
/// yields at least one record wins. Returns [`ExtractError::NoPayload`] with
/// a bounded excerpt when every strategy comes up empty; the caller is
/// expected to log and skip the page, not abort the run.
pub fn locate_payload(page: &str) -> Result<ExtractionResult, ExtractError> {
    let text = normalize(page)?;
    for strategy in [Strategy::PageData, Strategy::ContentArray, Strategy::IsinScan] {
        let found = match strategy {
            Strategy::PageData => try_page_data(&text),
            Strategy::ContentArray => try_content_array(&text),
            Strategy::IsinScan => try_isin_scan(&text),
        };
        if let Some(result) = found {
            if !result.records.is_empty() {
                tracing::debug!(
                    strategy = result.strategy.as_str(),
                    records = result.records.len(),
                    "payload located"
                );
                return Ok(result);
            }
        }
    }
    Err(ExtractError::NoPayload {
        excerpt: excerpt(&text),
    })
}

/// Extracts the single-record payload of a detail page. Detail pages wrap
/// one security's fields in the same `"pageData"` object the listings use,
/// either directly or as a one-element `content` array; as a fallback, the
/// first balanced object carrying an ISIN-shaped field is taken.
pub fn locate_detail_record(page: &str) -> Result<RawRecord, ExtractError> {
    let text = normalize(page)?;

    for (idx, _) in text.match_indices(PAGE_DATA_KEY) {
        let Some(start) = delimiter_after(text.as_str(), idx + PAGE_DATA_KEY.len()) else {
            continue;
        };
        let Ok(span) = balanced_span(&text, start) else {
            continue;
        };
        let Ok(value) = serde_json::from_str::<Value>(span) else {
            continue;
        };
        if let Some(first) = value
            .get("content")
            .and_then(Value::as_array)
            .and_then(|items| items.first())
            .and_then(Value::as_object)
        {
            return Ok(first.clone());
        }
        if let Some(object) = value.as_object() {
            return Ok(object.clone());
        }
    }

    for (idx, _) in text.match_indices('{') {
        let Ok(span) = balanced_span(&text, idx) else {
            continue;
        };
        let Ok(Value::Object(object)) = serde_json::from_str::<Value>(span) else {
            continue;
        };
        if has_isin_field(&object) {
            return Ok(object);
        }
    }

    Err(ExtractError::NoPayload {
        excerpt: excerpt(&text),
    })
}

/// Strategy 1: the `"pageData"` wrapper object. The object either carries
/// `content` directly or nests it one level down next to a `params` block.
fn try_page_data(text: &str) -> Option<ExtractionResult> {
    for (idx, _) in text.match_indices(PAGE_DATA_KEY) {
        let Some(start) = delimiter_after(text, idx + PAGE_DATA_KEY.len()) else {
            continue;
        };
        let Ok(span) = balanced_span(text, start) else {
            continue;
        };
        let Ok(value) = serde_json::from_str::<Value>(span) else {
            continue;
        };
        let inner = if value.get("content").is_some() {
            value
        } else if let Some(nested) = value.get("pageData").or_else(|| {
            value.get("params").and_then(|p| p.get("pageData"))
        }) {
            nested.clone()
        } else {
            continue;
        };
        let Some(content) = inner.get("content") else {
            continue;
        };
        let Some(records) = records_from_content(content) else {
            continue;
        };
        let pagination = pagination_from(&inner);
        return Some(ExtractionResult {
            records,
            pagination,
            strategy: Strategy::PageData,
        });
    }
    None
}

/// Strategy 2: a bare `"content"` array, no wrapper. Pagination fields are
/// recovered by key-scan when present anywhere in the text.
fn try_content_array(text: &str) -> Option<ExtractionResult> {
    for (idx, _) in text.match_indices(CONTENT_KEY) {
        let Some(start) = delimiter_after(text, idx + CONTENT_KEY.len()) else {
            continue;
        };
        if !text[start..].starts_with('[') {
            continue;
        }
        let Ok(span) = balanced_span(text, start) else {
            continue;
        };
        let Ok(value) = serde_json::from_str::<Value>(span) else {
            continue;
        };
        let Some(records) = records_from_content(&value) else {
            continue;
        };
        if records.is_empty() {
            continue;
        }
        return Some(ExtractionResult {
            records,
            pagination: scanned_pagination(text),
            strategy: Strategy::ContentArray,
        });
    }
    None
}

/// Strategy 3: generic fallback. Probes each `[{` for a balanced array of
/// objects where every object carries an ISIN-shaped field.
fn try_isin_scan(text: &str) -> Option<ExtractionResult> {
    for (idx, _) in text.match_indices('[') {
        if !text[idx + 1..].trim_start().starts_with('{') {
            continue;
        }
        let Ok(span) = balanced_span(text, idx) else {
            continue;
        };
        let Ok(Value::Array(items)) = serde_json::from_str::<Value>(span) else {
            continue;
        };
        let records: Vec<RawRecord> = items
            .into_iter()
            .filter_map(|item| match item {
                Value::Object(map) => Some(map),
                _ => None,
            })
            .collect();
        if records.is_empty() || !records.iter().all(has_isin_field) {
            continue;
        }
        return Some(ExtractionResult {
            records,
            pagination: scanned_pagination(text),
            strategy: Strategy::IsinScan,
        });
    }
    None
}

fn records_from_content(value: &Value) -> Option<Vec<RawRecord>> {
    let items = value.as_array()?;
    Some(
        items
            .iter()
            .filter_map(|item| item.as_object().cloned())
            .collect(),
    )
}

fn pagination_from(inner: &Value) -> Option<PaginationInfo> {
    let total_pages = inner.get("totalPages")?.as_u64()?;
    let total_elements = inner.get("totalElements")?.as_u64()?;
    let number = inner.get("number").and_then(Value::as_u64).unwrap_or(0);
    PaginationInfo::from_envelope(number, total_pages, total_elements)
}

fn scanned_pagination(text: &str) -> Option<PaginationInfo> {
    let total_pages = scan_number(text, "\"totalPages\":")?;
    let total_elements = scan_number(text, "\"totalElements\":")?;
    let number = scan_number(text, "\"number\":").unwrap_or(0);
    PaginationInfo::from_envelope(number, total_pages, total_elements)
}

fn scan_number(text: &str, key: &str) -> Option<u64> {
    let idx = text.find(key)?;
    let bytes = text.as_bytes();
    let mut i = idx + key.len();
    while i < bytes.len() && !bytes[i].is_ascii_digit() {
        i += 1;
    }
    let start = i;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
    }
    text[start..i].parse().ok()
}

fn has_isin_field(record: &RawRecord) -> bool {
    record.iter().any(|(key, value)| {
        let named_isin = key.to_ascii_lowercase().contains("isin") && !value.is_null();
        named_isin
            || value
                .as_str()
                .map(is_isin_shaped)
                .unwrap_or(false)
    })
}

/// Two letters, nine alphanumerics, one check digit.
fn is_isin_shaped(s: &str) -> bool {
    let bytes = s.as_bytes();
    bytes.len() == 12
        && bytes[..2].iter().all(u8::is_ascii_uppercase)
        && bytes[2..11]
            .iter()
            .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit())
        && bytes[11].is_ascii_digit()
}

fn excerpt(text: &str) -> String {
    let trimmed = text.trim_start();
    let mut chars = trimmed.chars();
    let mut out: String = chars.by_ref().take(EXCERPT_CHARS).collect();
    if chars.next().is_some() {
        out.push_str("...[truncated]");
    }
    out
}

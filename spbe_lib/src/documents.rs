//! Disclosure-document link discovery on bond and issuer pages.
//!
//! Documents are linked both as plain anchors in the HTML shell and as
//! absolute URLs inside the embedded payload, so both shapes are scanned.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use url::Url;

use crate::sanitize::sanitize_filename;

static HREF_DOC_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)href=["']([^"'<>]+?\.(?:pdf|docx?|xlsx?))["']"#).unwrap()
});

static BARE_DOC_URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)"(https?://[^"<>\s]+?\.(?:pdf|docx?|xlsx?))""#).unwrap()
});

static ISIN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b([A-Z]{2}[A-Z0-9]{9}[0-9])\b").unwrap());

/// One discovered document: its resolved URL and a safe local filename.
#[derive(Clone, Debug)]
pub struct DocumentLink {
    pub url: Url,
    pub filename: String,
}

/// Collects document links from page text, resolved against `page_url`,
/// deduplicated in discovery order.
pub fn collect_document_links(page_url: &Url, text: &str) -> Vec<DocumentLink> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut links = Vec::new();

    let candidates = HREF_DOC_RE
        .captures_iter(text)
        .chain(BARE_DOC_URL_RE.captures_iter(text))
        .filter_map(|cap| cap.get(1).map(|m| m.as_str().to_string()));

    for href in candidates {
        let Ok(url) = page_url.join(&href) else {
            tracing::debug!(href, "unjoinable document link");
            continue;
        };
        if !seen.insert(url.as_str().to_string()) {
            continue;
        }
        let Some(filename) = filename_from_url(&url) else {
            continue;
        };
        links.push(DocumentLink { url, filename });
    }

    links
}

/// First ISIN-shaped token in the text, for pages where the record itself
/// carries none.
pub fn find_isin(text: &str) -> Option<String> {
    ISIN_RE
        .captures(text)
        .and_then(|cap| cap.get(1))
        .map(|m| m.as_str().to_string())
}

fn filename_from_url(url: &Url) -> Option<String> {
    let segment = url.path_segments()?.filter(|s| !s.is_empty()).next_back()?;
    let name = sanitize_filename(segment);
    if name == "_" {
        return None;
    }
    Some(name)
}

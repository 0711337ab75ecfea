//! Extraction result types shared by the locator strategies.

use serde_json::{Map, Value};

/// One record as decoded from the payload: source field name to raw value.
/// Field names are whatever the source ships (`sisinCode`, `fullName`, ...);
/// nothing is normalized at this layer.
pub type RawRecord = Map<String, Value>;

/// Which locator strategy produced a result. Diagnostic only.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Strategy {
    /// The `"pageData"` wrapper object was present.
    PageData,
    /// A bare `"content"` array was found without the wrapper.
    ContentArray,
    /// Generic scan for an array of objects carrying an ISIN-shaped field.
    IsinScan,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::PageData => "page-data",
            Strategy::ContentArray => "content-array",
            Strategy::IsinScan => "isin-scan",
        }
    }
}

/// Pagination envelope accompanying a partial result page.
///
/// `current_page` is 1-based here; the wire format counts from zero.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PaginationInfo {
    pub current_page: u32,
    pub total_pages: u32,
    pub total_elements: u64,
}

impl PaginationInfo {
    /// Builds from the wire envelope, where `number` is the 0-based page
    /// index. Returns `None` for envelopes that violate
    /// `current_page <= total_pages` or claim zero pages.
    pub fn from_envelope(number: u64, total_pages: u64, total_elements: u64) -> Option<Self> {
        let current_page = u32::try_from(number.checked_add(1)?).ok()?;
        let total_pages = u32::try_from(total_pages).ok()?;
        if total_pages == 0 || current_page > total_pages {
            return None;
        }
        Some(Self {
            current_page,
            total_pages,
            total_elements,
        })
    }
}

/// The outcome of extracting one fetched page.
#[derive(Debug)]
pub struct ExtractionResult {
    /// Records in payload order.
    pub records: Vec<RawRecord>,
    /// Present only when the payload carried a pagination envelope.
    pub pagination: Option<PaginationInfo>,
    /// Strategy that won. Diagnostic only.
    pub strategy: Strategy,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_is_one_based() {
        let info = PaginationInfo::from_envelope(0, 119, 2363).unwrap();
        assert_eq!(info.current_page, 1);
        assert_eq!(info.total_pages, 119);
        assert_eq!(info.total_elements, 2363);
    }

    #[test]
    fn envelope_rejects_page_past_end() {
        assert!(PaginationInfo::from_envelope(5, 5, 100).is_none());
        assert!(PaginationInfo::from_envelope(0, 0, 0).is_none());
    }
}

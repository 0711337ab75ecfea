//! Error types for the extraction engine.

/// Errors produced while recovering an embedded payload from page text.
#[derive(thiserror::Error, Debug)]
pub enum ExtractError {
    /// An escape sequence in the page could not be decoded to valid text.
    #[error("undecodable escape sequence at byte {offset}")]
    Normalization { offset: usize },
    /// End of text was reached before the opening delimiter was closed.
    #[error("unbalanced '{open}' starting at byte {start}")]
    UnbalancedDelimiter { open: char, start: usize },
    /// No strategy produced a record. Carries a bounded page excerpt for diagnosis.
    #[error("no payload found in page; excerpt: {excerpt}")]
    NoPayload { excerpt: String },
    /// A located span was not parseable JSON.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

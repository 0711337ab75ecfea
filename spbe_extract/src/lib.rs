//! Embedded-payload extraction engine for server-rendered exchange pages.
//!
//! SPB Exchange ships its listing data as an escaped JSON blob inside HTML
//! (a framework bootstrap payload). This crate recovers it without touching
//! the network: [`normalize`] reduces the escaping to a single layer,
//! [`balanced_span`] recovers a syntactically complete JSON value from an
//! offset, and [`locate_payload`] tries an ordered list of strategies until
//! one yields records.

mod brackets;
mod errors;
mod locate;
mod normalize;
mod types;

pub use self::brackets::balanced_span;
pub use self::errors::ExtractError;
pub use self::locate::{locate_detail_record, locate_payload};
pub use self::normalize::normalize;
pub use self::types::{ExtractionResult, PaginationInfo, RawRecord, Strategy};

//! Scraper library for SPB Exchange bond reference data and prospectuses.
//!
//! Wraps the `spbe_extract` payload engine with everything a run needs:
//! an HTTP page fetcher behind a pluggable trait, sequential pagination,
//! the canonical field schema and normalizer, disclosure-document discovery,
//! and a bounded-concurrency downloader with retry and skip-if-present
//! semantics. All tunables come in through [`RunConfig`]; nothing is global.

pub mod config;
pub mod documents;
pub mod download;
pub mod error;
pub mod fetch;
pub mod mapping;
pub mod paginate;
pub mod refdata;
pub mod sanitize;
pub mod schema;
pub mod summary;
pub mod user_agent;

pub use spbe_extract;

pub use config::RunConfig;
pub use documents::DocumentLink;
pub use download::{DownloadOutcome, DownloadTask, Downloader};
pub use error::{ConfigError, FetchError, PageError, RunError};
pub use fetch::{HttpFetcher, PageFetcher};
pub use mapping::FieldMapper;
pub use paginate::{PageFailure, PageSet, Paginator};
pub use refdata::{document_tasks, CollectedBond, Harvest, ReferenceDataRun};
pub use schema::{BondRecord, CANONICAL_FIELDS};
pub use summary::RunSummary;

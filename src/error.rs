use scraper::error::SelectorErrorKind;

use crate::models::SnapshotKind;

/// Failures below the source-crawler boundary.
///
/// Only `SessionNotReady` ever crosses that boundary; every other variant
/// degrades the affected source to an empty result.
#[derive(thiserror::Error, Debug)]
pub enum CrawlError {
    /// Extraction attempted without a live browser session.
    #[error("browser session is not ready")]
    SessionNotReady,

    /// Navigation, settle timeout or a missing element.
    #[error("extraction failed for {url}: {cause}")]
    ExtractionFailed { url: String, cause: String },

    /// The page did not have the shape the extractor expects.
    #[error("unexpected page shape for {url}: {detail}")]
    UnexpectedFragment { url: String, detail: String },

    #[error("invalid source url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("invalid CSS selector: {0}")]
    Selector(String),
}

impl<'a> From<SelectorErrorKind<'a>> for CrawlError {
    fn from(err: SelectorErrorKind<'a>) -> Self {
        CrawlError::Selector(err.to_string())
    }
}

/// Read-side signal: no snapshot of this kind has been published yet.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("{kind} snapshot is not available yet")]
pub struct CacheNotReady {
    pub kind: SnapshotKind,
}

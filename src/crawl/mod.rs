//! Source crawling and snapshot assembly.

pub mod builder;
pub mod crawler;
pub mod source;

pub use builder::{BuildReport, SnapshotBuilder};
pub use crawler::{CrawlOutcome, SourceCrawler};
pub use source::{SourceCatalog, SourceDescriptor, SourceKind};

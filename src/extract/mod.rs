//! Page extractors: render a source page in a browser session and return its
//! raw, uninterpreted rows.
//!
//! Each source kind has its own [`Extractor`]; the crawler picks one through
//! [`ExtractorSet`]. Tests swap implementations or feed fixture HTML through
//! a fixture browser.

pub mod fixtures;
pub mod html;
pub mod live;
pub mod result;
pub mod today;

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use crate::browser::{ScrollPolicy, Session};
use crate::crawl::SourceKind;
use crate::error::CrawlError;

pub use fixtures::FixturesExtractor;
pub use live::LiveBoardExtractor;
pub use result::ResultExtractor;
pub use today::TodayExtractor;

/// Competition named by a header row, e.g. `England: Premier League`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CompetitionKey {
    pub region: String,
    pub competition: String,
}

/// Status column of a match row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusCell {
    pub classes: Vec<String>,
    pub text: String,
}

/// One odds column. `label` is `None` when the column shows nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OddsSlot {
    pub label: Option<String>,
    /// The source highlights the winning outcome's column
    pub winner: bool,
}

/// A match row exactly as it appears on the page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRow {
    /// Nearest competition header above the row
    pub group: Option<CompetitionKey>,
    pub date_cell: Option<String>,
    pub home_team: Option<String>,
    pub away_team: Option<String>,
    pub match_link: Option<String>,
    pub status: Option<StatusCell>,
    pub score: Option<String>,
    pub odds: Vec<OddsSlot>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawFragment {
    /// Match rows in document order
    Rows(Vec<RawRow>),
    /// Score line of a single match page; `None` when the page has none
    ScoreLine(Option<String>),
}

impl RawFragment {
    pub fn into_rows(self, url: &str) -> Result<Vec<RawRow>, CrawlError> {
        match self {
            RawFragment::Rows(rows) => Ok(rows),
            RawFragment::ScoreLine(_) => Err(CrawlError::UnexpectedFragment {
                url: url.to_string(),
                detail: "expected match rows, got a score line".to_string(),
            }),
        }
    }

    pub fn into_score_line(self, url: &str) -> Result<Option<String>, CrawlError> {
        match self {
            RawFragment::ScoreLine(line) => Ok(line),
            RawFragment::Rows(_) => Err(CrawlError::UnexpectedFragment {
                url: url.to_string(),
                detail: "expected a score line, got match rows".to_string(),
            }),
        }
    }
}

/// Capability to pull one kind of raw fragment out of a page.
#[async_trait]
pub trait Extractor: Send + Sync {
    async fn extract(&self, session: &Session, url: &str) -> Result<RawFragment, CrawlError>;

    /// Human-readable name for logging.
    fn name(&self) -> &str;
}

/// Timing knobs shared by the browser-backed extractors
#[derive(Debug, Clone, Copy)]
pub struct ExtractOptions {
    pub timeout: Duration,
    pub scroll: ScrollPolicy,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        ExtractOptions {
            timeout: Duration::from_secs(30),
            scroll: ScrollPolicy::default(),
        }
    }
}

/// One extractor per source kind plus the single-match result lookup.
#[derive(Clone)]
pub struct ExtractorSet {
    pub fixtures: Arc<dyn Extractor>,
    pub live: Arc<dyn Extractor>,
    pub today: Arc<dyn Extractor>,
    pub result: Arc<dyn Extractor>,
}

impl ExtractorSet {
    pub fn browser(options: ExtractOptions) -> Self {
        ExtractorSet {
            fixtures: Arc::new(FixturesExtractor::new(options.timeout)),
            live: Arc::new(LiveBoardExtractor::new(options.timeout)),
            today: Arc::new(TodayExtractor::new(options.timeout, options.scroll)),
            result: Arc::new(ResultExtractor::new(options.timeout)),
        }
    }

    pub fn for_kind(&self, kind: SourceKind) -> &Arc<dyn Extractor> {
        match kind {
            SourceKind::Fixtures => &self.fixtures,
            SourceKind::Live => &self.live,
            SourceKind::Today => &self.today,
        }
    }
}

/// Selector of the match table every list page renders
pub(crate) const MATCH_TABLE_SELECTOR: &str = "table.table-main";

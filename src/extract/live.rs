use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

use super::{html, Extractor, RawFragment, MATCH_TABLE_SELECTOR};
use crate::browser::{Interaction, PageRequest, Session};
use crate::error::CrawlError;

/// Tab that switches the board to in-play matches only
pub const LIVE_FILTER_SELECTOR: &str = "ul.list-tabs a[data-filter=\"live\"]";
/// Class the filter tab carries once selected
pub const LIVE_FILTER_ACTIVE_CLASS: &str = "current";

/// In-play board. The live filter is selected before reading the rows; the
/// click is skipped when the filter is already active.
pub struct LiveBoardExtractor {
    timeout: Duration,
}

impl LiveBoardExtractor {
    pub fn new(timeout: Duration) -> Self {
        LiveBoardExtractor { timeout }
    }
}

#[async_trait]
impl Extractor for LiveBoardExtractor {
    fn name(&self) -> &str {
        "live-board"
    }

    async fn extract(&self, session: &Session, url: &str) -> Result<RawFragment, CrawlError> {
        let request = PageRequest::new(url, MATCH_TABLE_SELECTOR, self.timeout).with_interaction(
            Interaction::SelectFilter {
                selector: LIVE_FILTER_SELECTOR.to_string(),
                active_class: LIVE_FILTER_ACTIVE_CLASS.to_string(),
            },
        );
        let page = session.render(request).await?;
        let rows = html::parse_rows(&page)?;
        debug!(url, rows = rows.len(), "live board extracted");
        Ok(RawFragment::Rows(rows))
    }
}

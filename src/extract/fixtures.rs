use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

use super::{html, Extractor, RawFragment, MATCH_TABLE_SELECTOR};
use crate::browser::{PageRequest, Session};
use crate::error::CrawlError;

/// Upcoming fixtures of one competition (static list, no interaction).
pub struct FixturesExtractor {
    timeout: Duration,
}

impl FixturesExtractor {
    pub fn new(timeout: Duration) -> Self {
        FixturesExtractor { timeout }
    }
}

#[async_trait]
impl Extractor for FixturesExtractor {
    fn name(&self) -> &str {
        "fixtures"
    }

    async fn extract(&self, session: &Session, url: &str) -> Result<RawFragment, CrawlError> {
        let request = PageRequest::new(url, MATCH_TABLE_SELECTOR, self.timeout);
        let page = session.render(request).await?;
        let rows = html::parse_rows(&page)?;
        debug!(url, rows = rows.len(), "fixtures extracted");
        Ok(RawFragment::Rows(rows))
    }
}

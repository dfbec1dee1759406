use async_trait::async_trait;
use std::time::Duration;

use super::{html, Extractor, RawFragment};
use crate::browser::{PageRequest, Session};
use crate::error::CrawlError;

const SCORE_LINE_SELECTOR: &str = "p.list-details__item__score";

/// Score line of a single match page, used to settle unknown results.
pub struct ResultExtractor {
    timeout: Duration,
}

impl ResultExtractor {
    pub fn new(timeout: Duration) -> Self {
        ResultExtractor { timeout }
    }
}

#[async_trait]
impl Extractor for ResultExtractor {
    fn name(&self) -> &str {
        "result-lookup"
    }

    async fn extract(&self, session: &Session, url: &str) -> Result<RawFragment, CrawlError> {
        let request = PageRequest::new(url, SCORE_LINE_SELECTOR, self.timeout);
        let page = session.render(request).await?;
        Ok(RawFragment::ScoreLine(html::parse_score_line(&page)?))
    }
}

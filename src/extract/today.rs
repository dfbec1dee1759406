use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

use super::{html, Extractor, RawFragment, MATCH_TABLE_SELECTOR};
use crate::browser::{PageRequest, ScrollPolicy, Session};
use crate::error::CrawlError;

/// All of today's matches on one lazily-loaded page. The page is scrolled
/// until its height stays put for the policy's quiet window.
pub struct TodayExtractor {
    timeout: Duration,
    scroll: ScrollPolicy,
}

impl TodayExtractor {
    pub fn new(timeout: Duration, scroll: ScrollPolicy) -> Self {
        TodayExtractor { timeout, scroll }
    }
}

#[async_trait]
impl Extractor for TodayExtractor {
    fn name(&self) -> &str {
        "today"
    }

    async fn extract(&self, session: &Session, url: &str) -> Result<RawFragment, CrawlError> {
        let request =
            PageRequest::new(url, MATCH_TABLE_SELECTOR, self.timeout).with_scroll(self.scroll);
        let page = session.render(request).await?;
        let rows = html::parse_rows(&page)?;
        debug!(url, rows = rows.len(), "today view extracted");
        Ok(RawFragment::Rows(rows))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::testing::{FixtureLauncher, FixturePages};
    use crate::browser::SessionManager;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_requests_scroll_policy() {
        let url = "https://x.test/football/";
        let pages = FixturePages::new().page(url, r#"<table class="table-main"></table>"#);
        let launcher = Arc::new(FixtureLauncher::new(pages));
        let manager = SessionManager::new(launcher.clone());
        let session = manager.acquire().await.unwrap();

        let policy = ScrollPolicy {
            quiet_window: Duration::from_secs(2),
            poll_interval: Duration::from_millis(100),
            max_rounds: 7,
        };
        TodayExtractor::new(Duration::from_secs(5), policy)
            .extract(&session, url)
            .await
            .unwrap();

        assert_eq!(launcher.requests()[0].scroll, Some(policy));
    }
}

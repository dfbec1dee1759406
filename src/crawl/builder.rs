//! Fans the crawler out over a source list and assembles one snapshot.
//!
//! Sources run with bounded concurrency over the shared session, each in
//! its own page context; output keeps catalog order. A degraded source only
//! removes its own blocks. A dead session aborts the whole build.

use chrono::Utc;
use futures_util::{stream, StreamExt, TryStreamExt};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{info, warn};

use super::{CrawlOutcome, SourceCrawler, SourceDescriptor};
use crate::browser::Session;
use crate::error::CrawlError;
use crate::models::{CompetitionBlock, Snapshot, SnapshotKind};

/// Summary of one build, logged by the scheduler.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildReport {
    pub kind: SnapshotKind,
    pub sources: usize,
    pub degraded_sources: usize,
    /// Sources that contributed no matches, degraded or not
    pub empty_sources: Vec<String>,
    pub blocks: usize,
    pub matches: usize,
    pub duplicates_dropped: usize,
    /// Enough sources came back empty that the page markup probably changed
    pub drift_suspected: bool,
}

impl BuildReport {
    /// Every source failed to extract. Such a snapshot is not worth publishing.
    pub fn total_failure(&self) -> bool {
        self.sources > 0 && self.degraded_sources == self.sources
    }
}

pub struct SnapshotBuilder {
    crawler: Arc<SourceCrawler>,
    concurrency: usize,
    drift_alarm_ratio: f64,
}

impl SnapshotBuilder {
    pub fn new(crawler: Arc<SourceCrawler>, concurrency: usize, drift_alarm_ratio: f64) -> Self {
        SnapshotBuilder {
            crawler,
            concurrency: concurrency.max(1),
            drift_alarm_ratio,
        }
    }

    pub async fn build(
        &self,
        session: &Session,
        kind: SnapshotKind,
        sources: &[SourceDescriptor],
    ) -> Result<(Snapshot, BuildReport), CrawlError> {
        // Crawl futures own their handles; builds run inside the spawned scheduler task
        let outcomes: Vec<(SourceDescriptor, CrawlOutcome)> = stream::iter(sources.to_vec())
            .map(|source| {
                let crawler = Arc::clone(&self.crawler);
                let session = session.clone();
                async move {
                    let outcome = crawler.crawl(&session, &source).await?;
                    Ok::<_, CrawlError>((source, outcome))
                }
            })
            .buffered(self.concurrency)
            .try_collect()
            .await?;

        let (snapshot, report) = self.assemble(kind, outcomes);
        info!(
            kind = %kind,
            sources = report.sources,
            degraded = report.degraded_sources,
            blocks = report.blocks,
            matches = report.matches,
            "snapshot built"
        );
        Ok((snapshot, report))
    }

    fn assemble(
        &self,
        kind: SnapshotKind,
        outcomes: Vec<(SourceDescriptor, CrawlOutcome)>,
    ) -> (Snapshot, BuildReport) {
        let mut report = BuildReport {
            kind,
            sources: outcomes.len(),
            degraded_sources: 0,
            empty_sources: Vec::new(),
            blocks: 0,
            matches: 0,
            duplicates_dropped: 0,
            drift_suspected: false,
        };

        let mut seen_links: HashSet<String> = HashSet::new();
        let mut blocks: Vec<CompetitionBlock> = Vec::new();
        for (source, outcome) in outcomes {
            if outcome.degraded {
                report.degraded_sources += 1;
            }
            if outcome.blocks.iter().all(CompetitionBlock::is_empty) {
                report.empty_sources.push(source.to_string());
            }

            for mut block in outcome.blocks {
                let before = block.matches.len();
                block
                    .matches
                    .retain(|m| seen_links.insert(m.match_link.clone()));
                report.duplicates_dropped += before - block.matches.len();
                if block.is_empty() {
                    continue;
                }

                // Two boards can both list a competition; keep one block for it
                match blocks
                    .iter_mut()
                    .find(|b| b.region == block.region && b.competition == block.competition)
                {
                    Some(existing) => existing.matches.append(&mut block.matches),
                    None => blocks.push(block),
                }
            }
        }

        report.blocks = blocks.len();
        report.matches = blocks.iter().map(|b| b.matches.len()).sum();
        report.drift_suspected = self.drift_suspected(&report);
        if report.drift_suspected {
            warn!(
                kind = %kind,
                empty = report.empty_sources.len(),
                sources = report.sources,
                "possible markup drift, sources without matches: {:?}",
                report.empty_sources
            );
        }

        let snapshot = Snapshot {
            kind,
            built_at: Utc::now(),
            blocks,
        };
        (snapshot, report)
    }

    fn drift_suspected(&self, report: &BuildReport) -> bool {
        if report.sources < 2 {
            return false;
        }
        let empty_ratio = report.empty_sources.len() as f64 / report.sources as f64;
        empty_ratio >= self.drift_alarm_ratio
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::testing::{FixtureLauncher, FixturePages};
    use crate::browser::SessionManager;
    use crate::extract::{ExtractOptions, ExtractorSet};
    use chrono::NaiveDate;
    use url::Url;

    fn fixtures_page(links: &[&str]) -> String {
        let rows: String = links
            .iter()
            .map(|link| {
                format!(
                    r#"<tr>
                      <td class="table-main__datetime">Today 20:00</td>
                      <td class="h-text-left"><a class="in-match" href="{link}"><span>Home</span> - <span>Away</span></a></td>
                      <td class="table-main__odds"><button>2.00</button></td>
                      <td class="table-main__odds"><button>3.00</button></td>
                      <td class="table-main__odds"><button>4.00</button></td>
                    </tr>"#
                )
            })
            .collect();
        format!(r#"<table class="table-main">{rows}</table>"#)
    }

    fn url_of(region: &str, competition: &str) -> String {
        format!("https://x.test/football/{region}/{competition}/fixtures/")
    }

    fn builder(drift_alarm_ratio: f64) -> SnapshotBuilder {
        let crawler = SourceCrawler::new(
            ExtractorSet::browser(ExtractOptions::default()),
            Url::parse("https://x.test").unwrap(),
            "football",
        )
        .with_reference_date(NaiveDate::from_ymd_opt(2026, 10, 18).unwrap());
        SnapshotBuilder::new(Arc::new(crawler), 2, drift_alarm_ratio)
    }

    fn sources() -> Vec<SourceDescriptor> {
        vec![
            SourceDescriptor::fixtures("England", "Premier League"),
            SourceDescriptor::fixtures("Spain", "LaLiga"),
            SourceDescriptor::fixtures("Italy", "Serie A"),
        ]
    }

    async fn start_session(pages: FixturePages) -> (SessionManager, Session) {
        let manager = SessionManager::new(Arc::new(FixtureLauncher::new(pages)));
        let session = manager.acquire().await.unwrap();
        (manager, session)
    }

    #[tokio::test]
    async fn test_three_competitions_in_catalog_order() {
        let pages = FixturePages::new()
            .page(&url_of("england", "premier-league"), &fixtures_page(&["/m/1/", "/m/2/"]))
            .page(&url_of("spain", "laliga"), &fixtures_page(&["/m/3/"]))
            .page(&url_of("italy", "serie-a"), &fixtures_page(&["/m/4/", "/m/5/"]));
        let (_manager, session) = start_session(pages).await;

        let (snapshot, report) = builder(0.5)
            .build(&session, SnapshotKind::Full, &sources())
            .await
            .unwrap();

        let names: Vec<_> = snapshot.blocks.iter().map(|b| b.competition.as_str()).collect();
        assert_eq!(names, vec!["Premier League", "LaLiga", "Serie A"]);
        assert_eq!(snapshot.kind, SnapshotKind::Full);
        assert_eq!(snapshot.match_count(), 5);
        assert_eq!(report.matches, 5);
        assert!(!report.drift_suspected);
        assert!(!report.total_failure());
    }

    #[tokio::test]
    async fn test_failed_source_only_loses_its_own_block() {
        let pages = FixturePages::new()
            .page(&url_of("england", "premier-league"), &fixtures_page(&["/m/1/"]))
            .failing(&url_of("spain", "laliga"))
            .page(&url_of("italy", "serie-a"), &fixtures_page(&["/m/4/"]));
        let (_manager, session) = start_session(pages).await;

        let (snapshot, report) = builder(0.9)
            .build(&session, SnapshotKind::Full, &sources())
            .await
            .unwrap();

        let names: Vec<_> = snapshot.blocks.iter().map(|b| b.competition.as_str()).collect();
        assert_eq!(names, vec!["Premier League", "Serie A"]);
        assert_eq!(report.degraded_sources, 1);
        assert_eq!(report.empty_sources, vec!["Spain: LaLiga".to_string()]);
        assert!(!report.drift_suspected);
    }

    #[tokio::test]
    async fn test_duplicate_links_keep_first_occurrence() {
        let pages = FixturePages::new()
            .page(&url_of("england", "premier-league"), &fixtures_page(&["/m/1/", "/m/2/"]))
            .page(&url_of("spain", "laliga"), &fixtures_page(&["/m/2/"]))
            .page(&url_of("italy", "serie-a"), &fixtures_page(&["/m/3/"]));
        let (_manager, session) = start_session(pages).await;

        let (snapshot, report) = builder(0.9)
            .build(&session, SnapshotKind::Full, &sources())
            .await
            .unwrap();

        assert_eq!(report.duplicates_dropped, 1);
        assert_eq!(snapshot.blocks.len(), 2, "LaLiga is left empty and dropped");
        assert_eq!(snapshot.blocks[0].matches.len(), 2);
    }

    #[tokio::test]
    async fn test_mostly_empty_build_raises_drift_alarm() {
        let pages = FixturePages::new()
            .page(&url_of("england", "premier-league"), &fixtures_page(&["/m/1/"]))
            .page(&url_of("spain", "laliga"), r#"<table class="table-main"></table>"#)
            .page(&url_of("italy", "serie-a"), r#"<table class="table-main"></table>"#);
        let (_manager, session) = start_session(pages).await;

        let (_, report) = builder(0.5)
            .build(&session, SnapshotKind::Full, &sources())
            .await
            .unwrap();

        assert!(report.drift_suspected);
        assert_eq!(report.degraded_sources, 0);
        assert!(!report.total_failure());
    }

    #[tokio::test]
    async fn test_all_sources_failing_is_total_failure() {
        let pages = FixturePages::new()
            .failing(&url_of("england", "premier-league"))
            .failing(&url_of("spain", "laliga"))
            .failing(&url_of("italy", "serie-a"));
        let (_manager, session) = start_session(pages).await;

        let (snapshot, report) = builder(0.5)
            .build(&session, SnapshotKind::Full, &sources())
            .await
            .unwrap();

        assert!(snapshot.blocks.is_empty());
        assert!(report.total_failure());
    }

    #[tokio::test]
    async fn test_dead_session_aborts_build() {
        let (manager, session) = start_session(FixturePages::new()).await;
        manager.release().await;

        let result = builder(0.5)
            .build(&session, SnapshotKind::Full, &sources())
            .await;
        assert!(matches!(result, Err(CrawlError::SessionNotReady)));
    }
}

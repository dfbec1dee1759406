use chrono::{Local, NaiveDate};
use tracing::{debug, warn};
use url::Url;

use super::{SourceDescriptor, SourceKind};
use crate::browser::Session;
use crate::error::CrawlError;
use crate::extract::ExtractorSet;
use crate::models::{CompetitionBlock, MatchResult, MatchState};
use crate::normalize::{normalize_rows, result_from_score_line, NormalizedRow};

/// What one source contributed to a build.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlOutcome {
    pub blocks: Vec<CompetitionBlock>,
    /// Extraction failed and the source was replaced by nothing
    pub degraded: bool,
}

/// Crawls a single source: extract, normalize, group into blocks.
pub struct SourceCrawler {
    extractors: ExtractorSet,
    base_url: Url,
    sport: String,
    result_lookups: usize,
    reference: Option<NaiveDate>,
}

impl SourceCrawler {
    pub fn new(extractors: ExtractorSet, base_url: Url, sport: impl Into<String>) -> Self {
        SourceCrawler {
            extractors,
            base_url,
            sport: sport.into(),
            result_lookups: 0,
            reference: None,
        }
    }

    /// Allow up to `limit` single-match lookups per source for finished
    /// matches whose winner the list page does not mark.
    pub fn with_result_lookups(mut self, limit: usize) -> Self {
        self.result_lookups = limit;
        self
    }

    /// Pin the calendar date used for `Today` / `Tomorrow` and year inference.
    pub fn with_reference_date(mut self, date: NaiveDate) -> Self {
        self.reference = Some(date);
        self
    }

    fn reference_date(&self) -> NaiveDate {
        self.reference.unwrap_or_else(|| Local::now().date_naive())
    }

    /// Crawl `source`. Every failure except [`CrawlError::SessionNotReady`]
    /// degrades the source to zero blocks.
    pub async fn crawl(
        &self,
        session: &Session,
        source: &SourceDescriptor,
    ) -> Result<CrawlOutcome, CrawlError> {
        match self.try_crawl(session, source).await {
            Ok(blocks) => Ok(CrawlOutcome {
                blocks,
                degraded: false,
            }),
            Err(CrawlError::SessionNotReady) => Err(CrawlError::SessionNotReady),
            Err(e) => {
                warn!(source = %source, "source degraded to empty: {}", e);
                Ok(CrawlOutcome {
                    blocks: Vec::new(),
                    degraded: true,
                })
            }
        }
    }

    async fn try_crawl(
        &self,
        session: &Session,
        source: &SourceDescriptor,
    ) -> Result<Vec<CompetitionBlock>, CrawlError> {
        let url = source.url(&self.base_url, &self.sport)?;
        let extractor = self.extractors.for_kind(source.kind);
        let rows = extractor
            .extract(session, url.as_str())
            .await?
            .into_rows(url.as_str())?;

        let mut normalized = normalize_rows(rows, self.reference_date());
        self.resolve_results(session, &mut normalized).await?;

        let blocks = group_blocks(source, normalized);
        debug!(
            source = %source,
            extractor = extractor.name(),
            blocks = blocks.len(),
            "source crawled"
        );
        Ok(blocks)
    }

    /// Look finished matches with no marked winner up on their own page.
    /// A failed lookup leaves the result `UNKNOWN`.
    async fn resolve_results(
        &self,
        session: &Session,
        rows: &mut [NormalizedRow],
    ) -> Result<(), CrawlError> {
        let pending = rows
            .iter_mut()
            .filter(|r| {
                matches!(
                    r.record.state,
                    MatchState::Finished {
                        result: MatchResult::Unknown,
                        ..
                    }
                )
            })
            .take(self.result_lookups);

        for row in pending {
            let url = match self.base_url.join(&row.record.match_link) {
                Ok(url) => url,
                Err(e) => {
                    debug!(link = %row.record.match_link, "unresolvable match link: {}", e);
                    continue;
                }
            };
            let line = match self
                .extractors
                .result
                .extract(session, url.as_str())
                .await
                .and_then(|fragment| fragment.into_score_line(url.as_str()))
            {
                Ok(line) => line,
                Err(CrawlError::SessionNotReady) => return Err(CrawlError::SessionNotReady),
                Err(e) => {
                    debug!(url = %url, "result lookup failed: {}", e);
                    continue;
                }
            };

            if let (Some(resolved), MatchState::Finished { result, .. }) = (
                line.as_deref().and_then(result_from_score_line),
                &mut row.record.state,
            ) {
                *result = resolved;
            }
        }
        Ok(())
    }
}

/// Fixtures pages belong to their descriptor; boards are split by the
/// competition headers on the page, in order of first appearance.
fn group_blocks(source: &SourceDescriptor, rows: Vec<NormalizedRow>) -> Vec<CompetitionBlock> {
    if source.kind == SourceKind::Fixtures {
        let mut block = CompetitionBlock::new(&source.region, &source.competition);
        block.matches = rows.into_iter().map(|r| r.record).collect();
        return vec![block];
    }

    let mut blocks: Vec<CompetitionBlock> = Vec::new();
    for row in rows {
        let (region, competition) = match &row.group {
            Some(key) => (key.region.as_str(), key.competition.as_str()),
            None => (source.region.as_str(), source.competition.as_str()),
        };
        let index = match blocks
            .iter()
            .position(|b| b.region == region && b.competition == competition)
        {
            Some(index) => index,
            None => {
                blocks.push(CompetitionBlock::new(region, competition));
                blocks.len() - 1
            }
        };
        blocks[index].matches.push(row.record);
    }
    blocks
}

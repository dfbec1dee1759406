use anyhow::Context;
use serde::Deserialize;
use std::fmt;
use std::path::Path;
use url::Url;

use crate::models::SnapshotKind;

/// Which page layout a source points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Upcoming list of a single competition
    #[default]
    Fixtures,
    /// In-play board, filtered to live matches
    Live,
    /// Every match of the day, lazily loaded
    Today,
}

/// One configured crawl target.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SourceDescriptor {
    pub region: String,
    pub competition: String,
    #[serde(default)]
    pub kind: SourceKind,
    /// Explicit page URL, absolute or relative to the source base
    #[serde(default)]
    pub link: Option<String>,
}

impl SourceDescriptor {
    pub fn fixtures(region: impl Into<String>, competition: impl Into<String>) -> Self {
        SourceDescriptor {
            region: region.into(),
            competition: competition.into(),
            kind: SourceKind::Fixtures,
            link: None,
        }
    }

    /// The whole-day view used when the catalog names no live or today source.
    pub fn today_aggregate() -> Self {
        SourceDescriptor {
            region: "World".to_string(),
            competition: "Today".to_string(),
            kind: SourceKind::Today,
            link: None,
        }
    }

    /// Page URL of this source under `base`.
    pub fn url(&self, base: &Url, sport: &str) -> Result<Url, url::ParseError> {
        if let Some(link) = &self.link {
            return base.join(link);
        }
        let path = match self.kind {
            SourceKind::Fixtures => format!(
                "{}/{}/{}/fixtures/",
                slug(sport),
                slug(&self.region),
                slug(&self.competition)
            ),
            SourceKind::Live | SourceKind::Today => format!("{}/", slug(sport)),
        };
        base.join(&path)
    }
}

impl fmt::Display for SourceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.region, self.competition)
    }
}

/// Lower-cased, spaces to hyphens: `Premier League` → `premier-league`.
pub fn slug(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
        .to_lowercase()
}

/// Every configured source, split per snapshot kind.
#[derive(Debug, Clone, Default)]
pub struct SourceCatalog {
    sources: Vec<SourceDescriptor>,
}

impl SourceCatalog {
    pub fn from_sources(sources: Vec<SourceDescriptor>) -> Self {
        SourceCatalog { sources }
    }

    /// Read a JSON array of descriptors.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading source catalog {}", path.display()))?;
        let sources: Vec<SourceDescriptor> = serde_json::from_str(&raw)
            .with_context(|| format!("parsing source catalog {}", path.display()))?;
        Ok(Self::from_sources(sources))
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    /// Regions of the fixtures sources, in catalog order, repeats included.
    pub fn fixture_regions(&self) -> impl Iterator<Item = &str> {
        self.sources
            .iter()
            .filter(|s| s.kind == SourceKind::Fixtures)
            .map(|s| s.region.as_str())
    }

    /// Sources crawled for `kind`, in catalog order.
    pub fn for_snapshot(&self, kind: SnapshotKind) -> Vec<SourceDescriptor> {
        match kind {
            SnapshotKind::Full => self
                .sources
                .iter()
                .filter(|s| s.kind == SourceKind::Fixtures)
                .cloned()
                .collect(),
            SnapshotKind::Today => {
                let sources: Vec<_> = self
                    .sources
                    .iter()
                    .filter(|s| s.kind != SourceKind::Fixtures)
                    .cloned()
                    .collect();
                if sources.is_empty() {
                    vec![SourceDescriptor::today_aggregate()]
                } else {
                    sources
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://www.betexplorer.com").unwrap()
    }

    #[test]
    fn test_fixtures_url_uses_slugs() {
        let source = SourceDescriptor::fixtures("England", "Premier League");
        assert_eq!(
            source.url(&base(), "football").unwrap().as_str(),
            "https://www.betexplorer.com/football/england/premier-league/fixtures/"
        );
    }

    #[test]
    fn test_board_url_and_explicit_link() {
        let today = SourceDescriptor::today_aggregate();
        assert_eq!(
            today.url(&base(), "football").unwrap().as_str(),
            "https://www.betexplorer.com/football/"
        );

        let linked = SourceDescriptor {
            link: Some("/football/spain/laliga/".to_string()),
            ..SourceDescriptor::fixtures("Spain", "LaLiga")
        };
        assert_eq!(
            linked.url(&base(), "football").unwrap().as_str(),
            "https://www.betexplorer.com/football/spain/laliga/"
        );
    }

    #[test]
    fn test_slug() {
        assert_eq!(slug("  Serie  A "), "serie-a");
        assert_eq!(slug("LaLiga"), "laliga");
    }

    #[test]
    fn test_catalog_parsing_defaults_to_fixtures() {
        let sources: Vec<SourceDescriptor> = serde_json::from_str(
            r#"[
                {"region": "England", "competition": "Premier League"},
                {"region": "World", "competition": "Live", "kind": "live"}
            ]"#,
        )
        .unwrap();
        assert_eq!(sources[0].kind, SourceKind::Fixtures);
        assert_eq!(sources[1].kind, SourceKind::Live);
        assert!(sources[0].link.is_none());
    }

    #[test]
    fn test_catalog_split_per_snapshot_kind() {
        let catalog = SourceCatalog::from_sources(vec![
            SourceDescriptor::fixtures("England", "Premier League"),
            SourceDescriptor::fixtures("Spain", "LaLiga"),
        ]);
        assert_eq!(catalog.for_snapshot(SnapshotKind::Full).len(), 2);
        assert_eq!(
            catalog.for_snapshot(SnapshotKind::Today),
            vec![SourceDescriptor::today_aggregate()]
        );

        let catalog = SourceCatalog::from_sources(vec![SourceDescriptor {
            kind: SourceKind::Live,
            ..SourceDescriptor::fixtures("World", "Live")
        }]);
        assert!(catalog.for_snapshot(SnapshotKind::Full).is_empty());
        assert_eq!(catalog.for_snapshot(SnapshotKind::Today)[0].kind, SourceKind::Live);
    }

    #[test]
    fn test_fixture_regions_skip_boards() {
        let catalog = SourceCatalog::from_sources(vec![
            SourceDescriptor::fixtures("England", "Premier League"),
            SourceDescriptor::today_aggregate(),
            SourceDescriptor::fixtures("England", "Championship"),
        ]);
        let regions: Vec<&str> = catalog.fixture_regions().collect();
        assert_eq!(regions, vec!["England", "England"]);
    }

    #[test]
    fn test_load_reports_missing_file() {
        let err = SourceCatalog::load("/nonexistent/sources.json").unwrap_err();
        assert!(err.to_string().contains("reading source catalog"));
    }
}

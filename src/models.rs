use chrono::{DateTime, Utc};
use serde::Serialize;

/// Final score of a live or finished match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Score {
    pub home: u32,
    pub away: u32,
}

/// Winner determination for a finished match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchResult {
    Home,
    Draw,
    Away,
    /// No winner marker was found on the page
    Unknown,
}

/// Status of a match together with exactly the fields that status allows.
///
/// Serialized flattened into [`MatchRecord`] as `"status": "LIVE"` plus the
/// variant's fields, so a record can never carry a `score` while `SCHEDULED`
/// or a `dateTime` once `FINISHED`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchState {
    Scheduled {
        /// `MM-DD-YYYY H:MM EST`, verbatim source text, or `date not available`
        #[serde(rename = "dateTime")]
        date_time: String,
    },
    Live {
        /// Elapsed-minute text exactly as the source displays it, e.g. `67'`
        minute: String,
        score: Score,
    },
    Finished {
        score: Score,
        result: MatchResult,
    },
}

impl MatchState {
    pub fn is_live(&self) -> bool {
        matches!(self, MatchState::Live { .. })
    }

    pub fn is_finished(&self) -> bool {
        matches!(self, MatchState::Finished { .. })
    }

    pub fn date_time(&self) -> Option<&str> {
        match self {
            MatchState::Scheduled { date_time } => Some(date_time),
            _ => None,
        }
    }
}

/// One fixture, live match or result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchRecord {
    pub home_team: String,
    pub away_team: String,
    #[serde(flatten)]
    pub state: MatchState,
    /// Decimal odds in home, draw, away order (at most three)
    pub odds: Vec<String>,
    /// Source-relative link of the match page; unique within a snapshot
    pub match_link: String,
}

/// Matches of one region + competition pair, in page order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompetitionBlock {
    pub region: String,
    pub competition: String,
    pub matches: Vec<MatchRecord>,
}

impl CompetitionBlock {
    pub fn new(region: impl Into<String>, competition: impl Into<String>) -> Self {
        CompetitionBlock {
            region: region.into(),
            competition: competition.into(),
            matches: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }
}

/// Which crawl produced a snapshot. Each kind is cached independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SnapshotKind {
    /// Every configured competition's fixtures page
    Full,
    /// The lighter "matches happening today" views
    Today,
}

impl std::fmt::Display for SnapshotKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SnapshotKind::Full => f.write_str("full"),
            SnapshotKind::Today => f.write_str("today"),
        }
    }
}

/// One complete, immutable result of a refresh cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub kind: SnapshotKind,
    pub built_at: DateTime<Utc>,
    pub blocks: Vec<CompetitionBlock>,
}

impl Snapshot {
    pub fn match_count(&self) -> usize {
        self.blocks.iter().map(|b| b.matches.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(state: MatchState) -> MatchRecord {
        MatchRecord {
            home_team: "Arsenal".into(),
            away_team: "Chelsea".into(),
            state,
            odds: vec!["1.85".into(), "3.60".into(), "4.20".into()],
            match_link: "/football/england/premier-league/arsenal-chelsea/Ab12Cd34/".into(),
        }
    }

    #[test]
    fn test_scheduled_serializes_only_date_time() {
        let value = serde_json::to_value(record(MatchState::Scheduled {
            date_time: "05-12-2026 13:00 EST".into(),
        }))
        .unwrap();
        assert_eq!(value["status"], "SCHEDULED");
        assert_eq!(value["dateTime"], "05-12-2026 13:00 EST");
        assert!(value.get("score").is_none());
        assert!(value.get("minute").is_none());
        assert!(value.get("result").is_none());
    }

    #[test]
    fn test_live_serializes_minute_and_score() {
        let value = serde_json::to_value(record(MatchState::Live {
            minute: "67'".into(),
            score: Score { home: 2, away: 1 },
        }))
        .unwrap();
        assert_eq!(value["status"], "LIVE");
        assert_eq!(value["minute"], "67'");
        assert_eq!(value["score"], json!({"home": 2, "away": 1}));
        assert!(value.get("dateTime").is_none());
        assert!(value.get("result").is_none());
    }

    #[test]
    fn test_finished_serializes_score_and_result() {
        let value = serde_json::to_value(record(MatchState::Finished {
            score: Score { home: 0, away: 0 },
            result: MatchResult::Unknown,
        }))
        .unwrap();
        assert_eq!(value["status"], "FINISHED");
        assert_eq!(value["result"], "UNKNOWN");
        assert_eq!(value["homeTeam"], "Arsenal");
        assert_eq!(
            value["matchLink"],
            "/football/england/premier-league/arsenal-chelsea/Ab12Cd34/"
        );
        assert!(value.get("dateTime").is_none());
        assert!(value.get("minute").is_none());
    }
}

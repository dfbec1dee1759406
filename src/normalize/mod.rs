//! Pure conversion of raw page rows into canonical match records.

pub mod datetime;
pub mod status;

use chrono::NaiveDate;
use tracing::debug;

use crate::extract::{CompetitionKey, RawRow};
use crate::models::MatchRecord;

pub use datetime::{infer_kickoffs, parse_kickoff, KickOff};
pub use status::{classify, result_from_score_line, Classification, DropReason};

/// A kept row: its record plus the competition header it sat under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedRow {
    pub group: Option<CompetitionKey>,
    pub record: MatchRecord,
}

/// Normalize the rows of one page against the calendar date `reference`.
///
/// Kick-offs are inferred over all rows first (odds-less rows may still carry
/// the date header), then rows without odds, teams or link are discarded and
/// the rest classified.
pub fn normalize_rows(rows: Vec<RawRow>, reference: NaiveDate) -> Vec<NormalizedRow> {
    let kickoffs = infer_kickoffs(rows.iter().map(|r| r.date_cell.as_deref()), reference);

    let mut kept = Vec::with_capacity(rows.len());
    let mut dropped = 0usize;
    for (row, kickoff) in rows.into_iter().zip(kickoffs) {
        match normalize_row(row, &kickoff, reference) {
            Ok(normalized) => kept.push(normalized),
            Err(reason) => {
                dropped += 1;
                debug!(?reason, "row dropped");
            }
        }
    }
    if dropped > 0 {
        debug!(kept = kept.len(), dropped, "rows normalized");
    }
    kept
}

fn normalize_row(
    row: RawRow,
    kickoff: &KickOff,
    reference: NaiveDate,
) -> Result<NormalizedRow, DropReason> {
    if status::has_no_odds(&row.odds) {
        return Err(DropReason::NoOdds);
    }
    let (Some(home_team), Some(away_team)) = (row.home_team.clone(), row.away_team.clone()) else {
        return Err(DropReason::MissingTeams);
    };
    let match_link = row.match_link.clone().ok_or(DropReason::MissingLink)?;

    let state = match classify(
        row.status.as_ref(),
        row.score.as_deref(),
        &row.odds,
        || scheduled_kickoff(&row, kickoff, reference),
    ) {
        Classification::Keep(state) => state,
        Classification::Drop(reason) => return Err(reason),
    };

    Ok(NormalizedRow {
        group: row.group,
        record: MatchRecord {
            home_team,
            away_team,
            state,
            odds: row.odds.into_iter().filter_map(|slot| slot.label).collect(),
            match_link,
        },
    })
}

/// Fixture pages carry a date column; boards only show today's time of day
/// in the status column.
fn scheduled_kickoff(row: &RawRow, kickoff: &KickOff, reference: NaiveDate) -> String {
    let board_time = row
        .status
        .as_ref()
        .map(|s| s.text.trim())
        .filter(|t| !t.is_empty());

    match (&row.date_cell, board_time) {
        (None, Some(text)) => match parse_kickoff(&format!("Today {}", text), reference) {
            Some(at) => KickOff::At(at).to_string(),
            None => text.to_string(),
        },
        _ => kickoff.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::{OddsSlot, StatusCell};
    use crate::models::{MatchResult, MatchState, Score};

    fn reference() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 18).unwrap()
    }

    fn odds(labels: [Option<&str>; 3]) -> Vec<OddsSlot> {
        labels
            .iter()
            .map(|l| OddsSlot {
                label: l.map(str::to_string),
                winner: false,
            })
            .collect()
    }

    /// `status` is `(space-separated classes, text)`
    fn row(
        link: &str,
        date: Option<&str>,
        status: Option<(&str, &str)>,
        score: Option<&str>,
    ) -> RawRow {
        RawRow {
            group: None,
            date_cell: date.map(str::to_string),
            home_team: Some("Home FC".into()),
            away_team: Some("Away FC".into()),
            match_link: Some(link.to_string()),
            status: status.map(|(classes, text)| StatusCell {
                classes: classes.split_whitespace().map(str::to_string).collect(),
                text: text.to_string(),
            }),
            score: score.map(str::to_string),
            odds: odds([Some("1.90"), Some("3.40"), Some("4.00")]),
        }
    }

    fn date_times(rows: &[NormalizedRow]) -> Vec<Option<&str>> {
        rows.iter().map(|r| r.record.state.date_time()).collect()
    }

    #[test]
    fn test_date_inheritance_across_rows() {
        let rows = vec![
            row("/m/1/", Some("12.5. 14:00"), None, None),
            row("/m/2/", None, None, None),
            row("/m/3/", None, None, None),
        ];
        let out = normalize_rows(rows, reference());
        assert_eq!(date_times(&out), vec![Some("05-12-2026 13:00 EST"); 3]);
    }

    #[test]
    fn test_odds_less_row_still_carries_date() {
        let mut header_like = row("/m/0/", Some("13.5. 20:00"), None, None);
        header_like.odds = odds([None, None, None]);
        let rows = vec![header_like, row("/m/1/", None, None, None)];

        let out = normalize_rows(rows, reference());
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].record.match_link, "/m/1/");
        assert_eq!(date_times(&out), vec![Some("05-13-2026 19:00 EST")]);
    }

    #[test]
    fn test_board_time_is_today() {
        let rows = vec![row("/m/1/", None, Some(("table-main__time", "20:45")), None)];
        let out = normalize_rows(rows, reference());
        assert_eq!(date_times(&out), vec![Some("10-18-2026 19:45 EST")]);
    }

    #[test]
    fn test_no_date_anywhere() {
        let out = normalize_rows(vec![row("/m/1/", None, None, None)], reference());
        assert_eq!(date_times(&out), vec![Some(datetime::DATE_NOT_AVAILABLE)]);
    }

    #[test]
    fn test_rows_missing_identity_are_dropped() {
        let mut no_link = row("/m/1/", None, None, None);
        no_link.match_link = None;
        let mut no_team = row("/m/2/", None, None, None);
        no_team.away_team = None;

        let out = normalize_rows(
            vec![no_link, no_team, row("/m/3/", None, None, None)],
            reference(),
        );
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].record.match_link, "/m/3/");
    }

    #[test]
    fn test_partial_odds_keep_their_order() {
        let mut r = row("/m/1/", None, None, None);
        r.odds = odds([Some("2.10"), None, Some("3.30")]);
        let out = normalize_rows(vec![r], reference());
        assert_eq!(out[0].record.odds, vec!["2.10", "3.30"]);
    }

    #[test]
    fn test_every_kept_row_has_one_legal_state() {
        let mut finished = row("/m/3/", None, Some(("", "FT")), Some("2:2"));
        finished.odds[1].winner = true;
        let rows = vec![
            row("/m/1/", Some("Today 18:00"), None, None),
            row("/m/2/", None, Some(("table-main__time--live", "55'")), Some("0:1")),
            finished,
            row("/m/4/", None, Some(("", "CAN.")), None),
            row("/m/5/", None, Some(("", "AWA.")), Some("3:0")),
        ];

        let out = normalize_rows(rows, reference());
        assert_eq!(out.len(), 3, "awarded and cancelled rows are excluded");
        assert!(matches!(out[0].record.state, MatchState::Scheduled { .. }));
        assert_eq!(
            out[1].record.state,
            MatchState::Live {
                minute: "55'".into(),
                score: Score { home: 0, away: 1 }
            }
        );
        assert_eq!(
            out[2].record.state,
            MatchState::Finished {
                score: Score { home: 2, away: 2 },
                result: MatchResult::Draw
            }
        );
    }
}

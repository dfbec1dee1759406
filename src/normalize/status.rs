//! Status classification of a single match row.
//!
//! Every retained row gets exactly one terminal state:
//!
//! ```text
//!  status class *live*            ──▶ LIVE      (minute verbatim, score)
//!  text ∈ {FT, AET, PEN}          ──▶ FINISHED  (score, winner from odds)
//!  text ∈ awarded / cancelled     ──▶ dropped
//!  anything else                  ──▶ SCHEDULED (kick-off)
//! ```

use crate::extract::{OddsSlot, StatusCell};
use crate::models::{MatchResult, MatchState, Score};

const FINISHED_MARKERS: &[&str] = &["FT", "AET", "PEN"];
const VOID_MARKERS: &[&str] = &["AWA", "AWARDED", "CAN", "CANC", "CANCELLED", "CANCELED"];

/// Why a row never becomes a record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    NoOdds,
    MissingTeams,
    MissingLink,
    AwardedOrCancelled,
    FinishedWithoutScore,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    Keep(MatchState),
    Drop(DropReason),
}

/// Classify one row. `scheduled_at` supplies the kick-off text used when the
/// row turns out to be `SCHEDULED`.
pub fn classify<F>(
    status: Option<&StatusCell>,
    score: Option<&str>,
    odds: &[OddsSlot],
    scheduled_at: F,
) -> Classification
where
    F: FnOnce() -> String,
{
    let Some(cell) = status else {
        return Classification::Keep(MatchState::Scheduled {
            date_time: scheduled_at(),
        });
    };

    if is_live(cell) {
        return Classification::Keep(MatchState::Live {
            minute: cell.text.clone(),
            score: score.and_then(parse_score).unwrap_or(Score { home: 0, away: 0 }),
        });
    }

    let marker = marker_of(&cell.text);
    if FINISHED_MARKERS.contains(&marker.as_str()) {
        return match score.and_then(parse_score) {
            Some(score) => Classification::Keep(MatchState::Finished {
                score,
                result: winner_from_odds(odds),
            }),
            None => Classification::Drop(DropReason::FinishedWithoutScore),
        };
    }
    if VOID_MARKERS.contains(&marker.as_str()) {
        return Classification::Drop(DropReason::AwardedOrCancelled);
    }

    Classification::Keep(MatchState::Scheduled {
        date_time: scheduled_at(),
    })
}

/// True when none of the odds slots shows a price.
pub fn has_no_odds(odds: &[OddsSlot]) -> bool {
    odds.iter().all(|slot| slot.label.is_none())
}

/// First highlighted slot in home, draw, away order.
pub fn winner_from_odds(odds: &[OddsSlot]) -> MatchResult {
    [MatchResult::Home, MatchResult::Draw, MatchResult::Away]
        .into_iter()
        .zip(odds)
        .find(|(_, slot)| slot.winner)
        .map(|(result, _)| result)
        .unwrap_or(MatchResult::Unknown)
}

/// Winner implied by a match page score line; `None` before kick-off
/// (`:`) or when the line is unreadable.
pub fn result_from_score_line(line: &str) -> Option<MatchResult> {
    let score = parse_score(line)?;
    Some(match score.home.cmp(&score.away) {
        std::cmp::Ordering::Greater => MatchResult::Home,
        std::cmp::Ordering::Less => MatchResult::Away,
        std::cmp::Ordering::Equal => MatchResult::Draw,
    })
}

/// `2:1`, tolerating surrounding text such as `2:1 (1:0)` or `3:2 ET`.
pub fn parse_score(text: &str) -> Option<Score> {
    let token = text.split_whitespace().find(|t| t.contains(':'))?;
    let (home, away) = token.split_once(':')?;
    Some(Score {
        home: home.trim().parse().ok()?,
        away: away.trim().parse().ok()?,
    })
}

fn is_live(cell: &StatusCell) -> bool {
    cell.classes
        .iter()
        .any(|c| c == "live" || c.ends_with("--live"))
}

fn marker_of(text: &str) -> String {
    text.trim().trim_end_matches('.').to_ascii_uppercase()
}

//! CSS-selector parsing of rendered match pages.
//!
//! Expected markup (one `tr` per match, header rows carry `th` only):
//!
//! ```text
//! <table class="table-main">
//!   <tr><th><a>England: Premier League</a></th></tr>
//!   <tr>
//!     <td class="table-main__datetime">12.05. 14:00</td>     fixtures pages
//!     <td class="table-main__time table-main__time--live">67'</td>  boards
//!     <td class="h-text-left"><a class="in-match" href="/…/"><span>A</span> - <span>B</span></a></td>
//!     <td class="table-main__result">2:1</td>
//!     <td class="table-main__odds colored"><button>1.85</button></td> ×3
//!   </tr>
//! </table>
//! ```

use scraper::{CaseSensitivity, ElementRef, Html, Selector};

use super::{CompetitionKey, OddsSlot, RawRow, StatusCell};
use crate::error::CrawlError;

/// Class the source puts on the odds column of the outcome that happened
pub const WINNER_CLASS: &str = "colored";

const MAX_ODDS_SLOTS: usize = 3;

struct RowSelectors {
    row: Selector,
    header: Selector,
    cell: Selector,
    date: Selector,
    teams: Selector,
    team_name: Selector,
    status: Selector,
    score: Selector,
    odds: Selector,
    odds_button: Selector,
    odds_value: Selector,
}

impl RowSelectors {
    fn new() -> Result<Self, CrawlError> {
        Ok(RowSelectors {
            row: Selector::parse("table.table-main tr")?,
            header: Selector::parse("th")?,
            cell: Selector::parse("td")?,
            date: Selector::parse("td.table-main__datetime")?,
            teams: Selector::parse("td.h-text-left a.in-match")?,
            team_name: Selector::parse("span")?,
            status: Selector::parse("td.table-main__time")?,
            score: Selector::parse("td.table-main__result")?,
            odds: Selector::parse("td.table-main__odds")?,
            odds_button: Selector::parse("button")?,
            odds_value: Selector::parse("[data-odd]")?,
        })
    }
}

/// Parse every match row of a list page, in document order.
pub fn parse_rows(html: &str) -> Result<Vec<RawRow>, CrawlError> {
    let selectors = RowSelectors::new()?;
    let document = Html::parse_document(html);

    let mut group: Option<CompetitionKey> = None;
    let mut rows = Vec::new();
    for row in document.select(&selectors.row) {
        if row.select(&selectors.cell).next().is_none() {
            // Round headings ("Round 5") leave the current group untouched
            if let Some(key) = row
                .select(&selectors.header)
                .find_map(|th| parse_header(&text_of(th)))
            {
                group = Some(key);
            }
            continue;
        }
        rows.push(parse_row(row, &selectors, group.clone()));
    }
    Ok(rows)
}

/// The score line of a single match page, e.g. `2:1`, or `:` before kick-off.
pub fn parse_score_line(html: &str) -> Result<Option<String>, CrawlError> {
    let selector = Selector::parse("p.list-details__item__score")?;
    let document = Html::parse_document(html);
    Ok(document.select(&selector).next().map(text_of))
}

fn parse_row(row: ElementRef, s: &RowSelectors, group: Option<CompetitionKey>) -> RawRow {
    let teams = row.select(&s.teams).next();
    let names: Vec<String> = teams
        .map(|a| a.select(&s.team_name).map(text_of).collect())
        .unwrap_or_default();
    let (home_team, away_team) = match names.as_slice() {
        [home, .., away] => (non_empty(home.clone()), non_empty(away.clone())),
        _ => (None, None),
    };

    let status = row.select(&s.status).next().map(|cell| StatusCell {
        classes: cell.value().classes().map(str::to_string).collect(),
        text: text_of(cell),
    });

    let odds = row
        .select(&s.odds)
        .take(MAX_ODDS_SLOTS)
        .map(|cell| parse_odds_slot(cell, s))
        .collect();

    RawRow {
        group,
        date_cell: row.select(&s.date).next().map(text_of).and_then(non_empty),
        home_team,
        away_team,
        match_link: teams
            .and_then(|a| a.value().attr("href"))
            .map(str::to_string)
            .and_then(non_empty),
        status,
        score: row.select(&s.score).next().map(text_of).and_then(non_empty),
        odds,
    }
}

fn parse_odds_slot(cell: ElementRef, s: &RowSelectors) -> OddsSlot {
    let label = cell
        .select(&s.odds_button)
        .next()
        .map(text_of)
        .and_then(non_empty)
        .or_else(|| cell.value().attr("data-odd").map(str::to_string))
        .or_else(|| {
            cell.select(&s.odds_value)
                .next()
                .and_then(|e| e.value().attr("data-odd"))
                .map(str::to_string)
        })
        .or_else(|| non_empty(text_of(cell)))
        .and_then(non_empty);

    OddsSlot {
        label,
        winner: cell
            .value()
            .has_class(WINNER_CLASS, CaseSensitivity::CaseSensitive),
    }
}

fn parse_header(text: &str) -> Option<CompetitionKey> {
    let (region, competition) = text.split_once(':')?;
    let region = region.trim();
    let competition = competition.trim();
    if region.is_empty() || competition.is_empty() {
        return None;
    }
    Some(CompetitionKey {
        region: region.to_string(),
        competition: competition.to_string(),
    })
}

/// Element text with whitespace runs collapsed.
fn text_of(element: ElementRef) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

fn non_empty(s: String) -> Option<String> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else if trimmed.len() == s.len() {
        Some(s)
    } else {
        Some(trimmed.to_string())
    }
}

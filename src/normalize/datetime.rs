//! Kick-off time inference.
//!
//! The source prints a date once and leaves it blank on the following rows
//! that share it, so rows are folded in document order with the last parsed
//! value as the accumulator. Displayed times run one hour ahead of the
//! published zone.

use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};
use std::fmt;

pub const ZONE_LABEL: &str = "EST";
pub const DATE_NOT_AVAILABLE: &str = "date not available";

const SOURCE_OFFSET_HOURS: i64 = 1;

/// Resolved kick-off of a row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KickOff {
    At(NaiveDateTime),
    /// Explicit text that matched no known form
    Verbatim(String),
    /// Nothing explicit and nothing to inherit
    NotAvailable,
}

impl fmt::Display for KickOff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KickOff::At(at) => write!(
                f,
                "{:02}-{:02}-{} {}:{:02} {}",
                at.month(),
                at.day(),
                at.year(),
                at.hour(),
                at.minute(),
                ZONE_LABEL
            ),
            KickOff::Verbatim(text) => f.write_str(text),
            KickOff::NotAvailable => f.write_str(DATE_NOT_AVAILABLE),
        }
    }
}

/// Resolve the date cells of a page, inheriting the last explicit value
/// into blank cells.
pub fn infer_kickoffs<'a, I>(cells: I, reference: NaiveDate) -> Vec<KickOff>
where
    I: IntoIterator<Item = Option<&'a str>>,
{
    let (_, kickoffs) = cells.into_iter().fold(
        (None, Vec::new()),
        |(last_known, mut out): (Option<NaiveDateTime>, Vec<KickOff>), cell| {
            let (last_known, kickoff) = step(last_known, cell, reference);
            out.push(kickoff);
            (last_known, out)
        },
    );
    kickoffs
}

fn step(
    last_known: Option<NaiveDateTime>,
    cell: Option<&str>,
    reference: NaiveDate,
) -> (Option<NaiveDateTime>, KickOff) {
    match cell.map(str::trim).filter(|t| !t.is_empty()) {
        Some(text) => match parse_kickoff(text, reference) {
            Some(at) => (Some(at), KickOff::At(at)),
            None => (last_known, KickOff::Verbatim(text.to_string())),
        },
        None => match last_known {
            Some(at) => (Some(at), KickOff::At(at)),
            None => (None, KickOff::NotAvailable),
        },
    }
}

/// Parse `Today 18:30`, `Tomorrow 18:30` or `12.5. 18:30` and shift it to
/// the published zone. Absolute dates take the year of `reference`.
pub fn parse_kickoff(text: &str, reference: NaiveDate) -> Option<NaiveDateTime> {
    let tokens: Vec<&str> = text.split_whitespace().collect();

    let (date, hour, minute) = if text.contains("Today") {
        let (h, m) = tokens.iter().find_map(|t| parse_clock(t))?;
        (reference, h, m)
    } else if text.contains("Tomorrow") {
        let (h, m) = tokens.iter().find_map(|t| parse_clock(t))?;
        (reference.succ_opt()?, h, m)
    } else {
        tokens.windows(2).find_map(|pair| {
            let date = parse_day_month(pair[0], reference.year())?;
            let (h, m) = parse_clock(pair[1])?;
            Some((date, h, m))
        })?
    };

    shift_to_published_zone(date, hour, minute)
}

/// Move a displayed time back by the source offset; an hour that drops
/// below zero lands on 23:xx of the previous day.
fn shift_to_published_zone(date: NaiveDate, hour: u32, minute: u32) -> Option<NaiveDateTime> {
    let mut date = date;
    let mut hour = i64::from(hour) - SOURCE_OFFSET_HOURS;
    if hour < 0 {
        date = date.pred_opt()?;
        hour = 23;
    }
    date.and_hms_opt(u32::try_from(hour).ok()?, minute, 0)
}

/// `H:MM` / `HH:MM`
fn parse_clock(token: &str) -> Option<(u32, u32)> {
    let (h, m) = token.split_once(':')?;
    if h.is_empty() || h.len() > 2 || m.len() != 2 {
        return None;
    }
    let hour: u32 = h.parse().ok()?;
    let minute: u32 = m.parse().ok()?;
    (hour < 24 && minute < 60).then_some((hour, minute))
}

/// `D.M.` / `DD.MM.`
fn parse_day_month(token: &str, year: i32) -> Option<NaiveDate> {
    let mut parts = token.strip_suffix('.')?.split('.');
    let day = parts.next()?;
    let month = parts.next()?;
    if parts.next().is_some()
        || day.is_empty()
        || day.len() > 2
        || month.is_empty()
        || month.len() > 2
    {
        return None;
    }
    NaiveDate::from_ymd_opt(year, month.parse().ok()?, day.parse().ok()?)
}

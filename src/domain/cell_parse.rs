//! Per-cell date and price coercion.
//!
//! Every function here returns `None` for a value the row normalizer should
//! skip; none of them fail loudly.

use crate::domain::table::Cell;
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeDelta};

const MILLIS_PER_DAY: f64 = 86_400_000.0;

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%Y.%m.%d",
    "%m/%d/%Y",
    "%Y年%m月%d日",
    "%d %b %Y",
    "%d %B %Y",
    "%b %d %Y",
    "%b %d, %Y",
    "%B %d, %Y",
];

/// Legacy spreadsheet day zero, 1899-12-30 00:00.
pub fn spreadsheet_epoch() -> Option<NaiveDateTime> {
    NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)
}

/// Convert a spreadsheet serial day count to a timestamp. Fractional days
/// carry the time of day, rounded to the millisecond.
pub fn from_spreadsheet_serial(days: f64) -> Option<NaiveDateTime> {
    if !days.is_finite() {
        return None;
    }
    let millis = (days * MILLIS_PER_DAY).round();
    let delta = TimeDelta::try_milliseconds(millis as i64)?;
    spreadsheet_epoch()?.checked_add_signed(delta)
}

/// Free-form date text: RFC 3339, common date-time layouts, date-only layouts,
/// then RFC 2822. Offsets are dropped in favour of the wall-clock time written.
pub fn parse_date_text(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.naive_local());
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, fmt) {
            return Some(dt);
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(text, fmt) {
            return d.and_hms_opt(0, 0, 0);
        }
    }
    DateTime::parse_from_rfc2822(text)
        .ok()
        .map(|dt| dt.naive_local())
}

/// Date cell dispatch: native date as-is, number as a spreadsheet serial,
/// text through [`parse_date_text`]. Serial zero is treated as no date.
pub fn parse_date_cell(cell: &Cell) -> Option<NaiveDateTime> {
    match cell {
        Cell::Date(dt) => Some(*dt),
        Cell::Number(days) if *days == 0.0 => None,
        Cell::Number(days) => from_spreadsheet_serial(*days),
        Cell::Text(text) => parse_date_text(text),
        Cell::Empty => None,
    }
}

/// Price cell: thousands separators stripped, must be a finite number > 0.
pub fn parse_price_cell(cell: &Cell) -> Option<f64> {
    let price = match cell {
        Cell::Number(n) => *n,
        Cell::Text(text) => text.replace(',', "").trim().parse::<f64>().ok()?,
        Cell::Date(_) | Cell::Empty => return None,
    };
    (price.is_finite() && price > 0.0).then_some(price)
}

//! Date/price column detection over free-form header names.
//!
//! Each role has a fixed, ordered list of case-insensitive substrings. The
//! first header (in table order) containing any of them wins, so an early
//! column matching a low-priority candidate beats a later column matching a
//! high-priority one.

use crate::domain::error::IngestError;
use tracing::debug;

pub const DATE_CANDIDATES: &[&str] = &["date", "日期", "time", "data"];
pub const PRICE_CANDIDATES: &[&str] = &["close", "收盤價", "price", "價格"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnRole {
    Date,
    Price,
}

impl ColumnRole {
    pub fn candidates(self) -> &'static [&'static str] {
        match self {
            ColumnRole::Date => DATE_CANDIDATES,
            ColumnRole::Price => PRICE_CANDIDATES,
        }
    }

    fn not_found(self) -> IngestError {
        let candidates = self.candidates().join(", ");
        match self {
            ColumnRole::Date => IngestError::DateColumnNotFound { candidates },
            ColumnRole::Price => IngestError::PriceColumnNotFound { candidates },
        }
    }
}

impl std::fmt::Display for ColumnRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ColumnRole::Date => write!(f, "date"),
            ColumnRole::Price => write!(f, "price"),
        }
    }
}

/// The two header names the normalizer reads from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnBinding {
    pub date_column: String,
    pub price_column: String,
}

/// Returns the first header containing any of `role`'s candidates.
pub fn find_column<'a>(headers: &'a [String], role: ColumnRole) -> Option<&'a str> {
    headers
        .iter()
        .find(|header| {
            let lower = header.to_lowercase();
            role.candidates().iter().any(|c| lower.contains(c))
        })
        .map(String::as_str)
}

/// Resolve the date and price columns. The date role is checked first.
pub fn resolve(headers: &[String]) -> Result<ColumnBinding, IngestError> {
    let date_column =
        find_column(headers, ColumnRole::Date).ok_or_else(|| ColumnRole::Date.not_found())?;
    let price_column =
        find_column(headers, ColumnRole::Price).ok_or_else(|| ColumnRole::Price.not_found())?;

    debug!(date_column, price_column, "resolved columns");

    Ok(ColumnBinding {
        date_column: date_column.to_string(),
        price_column: price_column.to_string(),
    })
}

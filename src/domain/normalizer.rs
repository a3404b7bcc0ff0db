//! Row normalization: raw table rows into a sorted [`Series`].
//!
//! Rows with a missing cell, an unparseable date or a non-positive price are
//! skipped, never fatal. Only a table with no surviving rows is an error.

use crate::domain::cell_parse::{parse_date_cell, parse_price_cell};
use crate::domain::column_resolver::ColumnBinding;
use crate::domain::error::IngestError;
use crate::domain::series::{Series, SeriesPoint};
use crate::domain::table::{Cell, Row, Table};
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    MissingCell,
    InvalidDate,
    InvalidPrice,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::MissingCell => write!(f, "missing cell"),
            SkipReason::InvalidDate => write!(f, "invalid date"),
            SkipReason::InvalidPrice => write!(f, "invalid price"),
        }
    }
}

/// Skipped-row counts per reason.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NormalizeReport {
    pub kept: usize,
    pub missing_cell: usize,
    pub invalid_date: usize,
    pub invalid_price: usize,
}

impl NormalizeReport {
    pub fn skipped(&self) -> usize {
        self.missing_cell + self.invalid_date + self.invalid_price
    }

    fn record_skip(&mut self, reason: SkipReason) {
        match reason {
            SkipReason::MissingCell => self.missing_cell += 1,
            SkipReason::InvalidDate => self.invalid_date += 1,
            SkipReason::InvalidPrice => self.invalid_price += 1,
        }
    }
}

pub fn normalize(table: &Table, binding: &ColumnBinding) -> Result<Series, IngestError> {
    normalize_with_report(table, binding).map(|(series, _)| series)
}

pub fn normalize_with_report(
    table: &Table,
    binding: &ColumnBinding,
) -> Result<(Series, NormalizeReport), IngestError> {
    let mut report = NormalizeReport::default();
    let mut points = Vec::with_capacity(table.rows.len());

    for (index, row) in table.rows.iter().enumerate() {
        match normalize_row(row, binding) {
            Ok(point) => points.push(point),
            Err(reason) => {
                debug!(row = index, %reason, "skipping row");
                report.record_skip(reason);
            }
        }
    }
    report.kept = points.len();

    // Stable: equal timestamps keep their post-filter order.
    points.sort_by_key(|p| p.timestamp);

    info!(
        kept = report.kept,
        missing_cell = report.missing_cell,
        invalid_date = report.invalid_date,
        invalid_price = report.invalid_price,
        "normalized table"
    );

    let series = Series::from_sorted(points).ok_or(IngestError::NoValidRows {
        rows: table.rows.len(),
    })?;
    Ok((series, report))
}

fn normalize_row(row: &Row, binding: &ColumnBinding) -> Result<SeriesPoint, SkipReason> {
    let date_cell = present_cell(row, &binding.date_column).ok_or(SkipReason::MissingCell)?;
    let price_cell = present_cell(row, &binding.price_column).ok_or(SkipReason::MissingCell)?;

    let timestamp = parse_date_cell(date_cell).ok_or(SkipReason::InvalidDate)?;
    let price = parse_price_cell(price_cell).ok_or(SkipReason::InvalidPrice)?;

    Ok(SeriesPoint::new(timestamp, price))
}

fn present_cell<'a>(row: &'a Row, column: &str) -> Option<&'a Cell> {
    row.get(column).filter(|cell| !cell.is_blank())
}

//! In-memory tabular payload handed over by a file-decoding adapter.

use chrono::NaiveDateTime;
use std::collections::HashMap;

/// A raw cell value as the decoder found it.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    /// A native calendar value decoded by the file reader.
    Date(NaiveDateTime),
    Number(f64),
    Text(String),
    Empty,
}

impl Cell {
    /// Null-equivalent cells: empty, whitespace-only text, and NaN.
    ///
    /// Numeric zero is a value; the date and price parsers reject it.
    pub fn is_blank(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(s) => s.trim().is_empty(),
            Cell::Number(n) => n.is_nan(),
            Cell::Date(_) => false,
        }
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        Cell::Text(s.to_string())
    }
}

impl From<f64> for Cell {
    fn from(n: f64) -> Self {
        Cell::Number(n)
    }
}

impl From<NaiveDateTime> for Cell {
    fn from(dt: NaiveDateTime) -> Self {
        Cell::Date(dt)
    }
}

pub type Row = HashMap<String, Cell>;

/// Header names in column order plus one header-keyed map per row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Row>,
}

impl Table {
    pub fn new(headers: Vec<String>) -> Self {
        Table {
            headers,
            rows: Vec::new(),
        }
    }

    /// Append a row given positionally; cells past the header width are dropped.
    pub fn push_row<I, C>(&mut self, cells: I)
    where
        I: IntoIterator<Item = C>,
        C: Into<Cell>,
    {
        let row: Row = self
            .headers
            .iter()
            .cloned()
            .zip(cells.into_iter().map(Into::into))
            .collect();
        self.rows.push(row);
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

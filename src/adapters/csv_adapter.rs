//! Delimited text table adapter.

use crate::domain::error::IngestError;
use crate::domain::table::{Cell, Table};
use crate::ports::table_port::TablePort;
use std::collections::HashSet;
use std::fs;
use std::io::Read;
use std::path::Path;

const BOM: char = '\u{feff}';

pub struct CsvAdapter {
    delimiter: u8,
}

impl Default for CsvAdapter {
    fn default() -> Self {
        Self { delimiter: b',' }
    }
}

impl CsvAdapter {
    pub fn new(delimiter: u8) -> Self {
        Self { delimiter }
    }

    /// Accepts a single ASCII character or one of `tab`, `comma`, `semicolon`, `pipe`.
    pub fn parse_delimiter(spec: &str) -> Option<u8> {
        match spec.trim().to_lowercase().as_str() {
            "tab" | "\\t" => Some(b'\t'),
            "comma" => Some(b','),
            "semicolon" => Some(b';'),
            "pipe" => Some(b'|'),
            s if s.len() == 1 && s.is_ascii() => s.bytes().next(),
            _ => None,
        }
    }

    pub fn read_table<R: Read>(&self, reader: R, source: &str) -> Result<Table, IngestError> {
        let table_err = |e: csv::Error| IngestError::TableRead {
            path: source.to_string(),
            reason: e.to_string(),
        };

        let mut rdr = csv::ReaderBuilder::new()
            .delimiter(self.delimiter)
            .flexible(true)
            .from_reader(reader);

        let headers = rdr
            .headers()
            .map_err(table_err)?
            .iter()
            .enumerate()
            .map(|(i, h)| {
                let h = if i == 0 { h.trim_start_matches(BOM) } else { h };
                h.trim().to_string()
            })
            .collect();

        let mut table = Table::new(unique_headers(headers));
        for result in rdr.records() {
            let record = result.map_err(table_err)?;
            table.push_row(record.iter().map(type_cell));
        }
        Ok(table)
    }
}

/// Repeated header names get a `_1`, `_2`, ... suffix so every column keeps
/// its own cells. The first occurrence keeps its name.
fn unique_headers(headers: Vec<String>) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::with_capacity(headers.len());
    headers
        .into_iter()
        .map(|header| {
            let mut name = header.clone();
            let mut n = 0;
            while seen.contains(&name) {
                n += 1;
                name = format!("{header}_{n}");
            }
            seen.insert(name.clone());
            name
        })
        .collect()
}

/// Blank text is empty; plain numeric text is a number; the rest stays text.
/// Text with thousands separators stays text so the price parser strips them.
fn type_cell(raw: &str) -> Cell {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Cell::Empty;
    }
    if !trimmed.contains(',') {
        if let Ok(n) = trimmed.parse::<f64>() {
            if n.is_finite() {
                return Cell::Number(n);
            }
        }
    }
    Cell::Text(trimmed.to_string())
}

impl TablePort for CsvAdapter {
    fn load_table(&self, path: &Path) -> Result<Table, IngestError> {
        let content = fs::read_to_string(path).map_err(|e| IngestError::TableRead {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        self.read_table(content.as_bytes(), &path.display().to_string())
    }
}

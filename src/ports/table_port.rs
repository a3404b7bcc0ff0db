//! Tabular input port trait.

use crate::domain::error::IngestError;
use crate::domain::table::Table;
use std::path::Path;

/// Decodes a file into an in-memory [`Table`]. Cell typing is the adapter's job.
pub trait TablePort {
    fn load_table(&self, path: &Path) -> Result<Table, IngestError>;
}

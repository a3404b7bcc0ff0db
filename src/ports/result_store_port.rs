//! Backtest result persistence port trait.

use crate::domain::error::IngestError;
use crate::domain::persistence::PersistenceRecord;

pub trait ResultStorePort {
    /// Insert or replace the record filed under `key`.
    fn save(&self, key: &str, record: &PersistenceRecord) -> Result<(), IngestError>;

    fn load(&self, key: &str) -> Result<Option<PersistenceRecord>, IngestError>;

    /// All stored keys, sorted.
    fn keys(&self) -> Result<Vec<String>, IngestError>;
}

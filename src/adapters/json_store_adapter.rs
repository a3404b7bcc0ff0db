//! Result store backed by a single JSON object file.

use crate::domain::error::IngestError;
use crate::domain::persistence::PersistenceRecord;
use crate::ports::result_store_port::ResultStorePort;
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use tracing::info;

pub struct JsonStoreAdapter {
    path: PathBuf,
}

impl JsonStoreAdapter {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    fn read_all(&self) -> Result<BTreeMap<String, PersistenceRecord>, IngestError> {
        match fs::read_to_string(&self.path) {
            Ok(content) if content.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(content) => serde_json::from_str(&content).map_err(|e| IngestError::Storage {
                reason: format!("corrupt store {}: {}", self.path.display(), e),
            }),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(IngestError::Storage {
                reason: format!("failed to read {}: {}", self.path.display(), e),
            }),
        }
    }
}

impl ResultStorePort for JsonStoreAdapter {
    fn save(&self, key: &str, record: &PersistenceRecord) -> Result<(), IngestError> {
        let mut records = self.read_all()?;
        records.insert(key.to_string(), record.clone());

        let content = serde_json::to_string_pretty(&records)?;
        fs::write(&self.path, content).map_err(|e| IngestError::Storage {
            reason: format!("failed to write {}: {}", self.path.display(), e),
        })?;
        info!(key, path = %self.path.display(), "saved result");
        Ok(())
    }

    fn load(&self, key: &str) -> Result<Option<PersistenceRecord>, IngestError> {
        Ok(self.read_all()?.remove(key))
    }

    fn keys(&self) -> Result<Vec<String>, IngestError> {
        Ok(self.read_all()?.into_keys().collect())
    }
}

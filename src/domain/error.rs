//! Domain error types.

/// Top-level error type for tabseries.
///
/// Per-row parse problems never show up here: the normalizer skips those rows
/// and only reports [`IngestError::NoValidRows`] when nothing survives.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("no date column found (accepted header substrings: {candidates})")]
    DateColumnNotFound { candidates: String },

    #[error("no price column found (accepted header substrings: {candidates})")]
    PriceColumnNotFound { candidates: String },

    #[error("no valid rows: all {rows} rows had a missing cell, bad date or non-positive price")]
    NoValidRows { rows: usize },

    #[error("failed to read table {path}: {reason}")]
    TableRead { path: String, reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("result store error: {reason}")]
    Storage { reason: String },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&IngestError> for std::process::ExitCode {
    fn from(err: &IngestError) -> Self {
        let code: u8 = match err {
            IngestError::Io(_) | IngestError::TableRead { .. } => 1,
            IngestError::ConfigParse { .. }
            | IngestError::ConfigMissing { .. }
            | IngestError::ConfigInvalid { .. } => 2,
            IngestError::Storage { .. } | IngestError::Serialization(_) => 3,
            IngestError::DateColumnNotFound { .. } | IngestError::PriceColumnNotFound { .. } => 4,
            IngestError::NoValidRows { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}

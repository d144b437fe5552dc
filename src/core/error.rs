//! Error types for the record core

pub type Result<T> = std::result::Result<T, RecordError>;

#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    /// JSON serialization error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Persisted record written by an unknown format version
    #[error("Unsupported wire version {found} (expected {expected})")]
    UnsupportedVersion { found: u32, expected: u32 },

    /// Persisted record is internally inconsistent
    #[error("Malformed record: {reason}")]
    MalformedRecord { reason: String },
}

impl RecordError {
    /// Create an unsupported version error
    pub fn unsupported_version(found: u32, expected: u32) -> Self {
        RecordError::UnsupportedVersion { found, expected }
    }

    /// Create a malformed record error
    pub fn malformed(reason: impl Into<String>) -> Self {
        RecordError::MalformedRecord {
            reason: reason.into(),
        }
    }
}

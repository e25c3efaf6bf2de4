//! Error types shared by the stores, the snapshot codec and the roster sheet.

use thiserror::Error;

/// Failure talking to the key/value storage that mirrors the stores.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage read failed for key `{key}`: {message}")]
    Read { key: String, message: String },

    #[error("storage write failed for key `{key}`: {message}")]
    Write { key: String, message: String },

    /// The stored text exists but does not decode into the expected shape.
    #[error("stored value for key `{key}` is not valid: {source}")]
    Decode {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to encode value for key `{key}`: {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("storage quota exceeded writing `{key}`: {needed} bytes needed, quota is {quota}")]
    QuotaExceeded {
        key: String,
        needed: usize,
        quota: usize,
    },
}

impl StorageError {
    pub fn key(&self) -> &str {
        match self {
            StorageError::Read { key, .. }
            | StorageError::Write { key, .. }
            | StorageError::Decode { key, .. }
            | StorageError::Encode { key, .. }
            | StorageError::QuotaExceeded { key, .. } => key,
        }
    }
}

/// Rejection of a snapshot document. The stores are never touched when this is returned.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("snapshot is not valid JSON: {0}")]
    Parse(#[source] serde_json::Error),

    #[error("invalid database format: missing `{0}`")]
    MissingField(&'static str),

    #[error("snapshot field `{field}` is malformed: {source}")]
    Malformed {
        field: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to read snapshot file: {0}")]
    Io(#[from] std::io::Error),
}

/// Rejection of a roster sheet.
#[derive(Debug, Error)]
pub enum RosterError {
    #[error("roster sheet is missing the `{0}` column")]
    MissingHeader(&'static str),

    #[error("no student rows found in the roster sheet")]
    NoRows,

    #[error("failed to read roster sheet: {0}")]
    Io(#[from] std::io::Error),
}

use std::path::PathBuf;

use lanshare_types::{ErrorKind, TypeError};

/// Errors produced by ledger and history operations.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// I/O error while reading or writing a JSON document.
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The document exists but does not decode as the expected shape.
    #[error("corrupt document {path}: {reason}")]
    Corrupt { path: PathBuf, reason: String },

    /// Serialization of an in-memory value failed.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Capacity value rejected.
    #[error(transparent)]
    Capacity(#[from] TypeError),
}

/// Result alias for ledger operations.
pub type LedgerResult<T> = Result<T, LedgerError>;

impl LedgerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Capacity(e) => e.kind(),
            Self::Io { .. } | Self::Corrupt { .. } | Self::Serialization(_) => {
                ErrorKind::PersistenceFailure
            }
        }
    }
}

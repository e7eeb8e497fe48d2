use lanshare_ledger::LedgerError;
use lanshare_types::{ErrorKind, TypeError};

/// Errors from artifact store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No content, or an empty candidate name.
    #[error("missing input: {0}")]
    MissingInput(&'static str),

    /// The candidate name has no extension, or one outside the whitelist.
    #[error("file type not allowed: {name}")]
    InvalidType { name: String },

    /// The upload exceeds the store's size ceiling.
    #[error("{size} bytes exceeds the {limit} byte limit")]
    TooLarge { size: u64, limit: u64 },

    /// No artifact with this name exists in the store.
    #[error("artifact not found: {0}")]
    NotFound(String),

    /// Capacity value rejected.
    #[error(transparent)]
    Capacity(#[from] TypeError),

    /// I/O error on the store directory.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Origin ledger failure surfaced from a read path.
    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),
}

impl StoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingInput(_) => ErrorKind::MissingInput,
            Self::InvalidType { .. } => ErrorKind::InvalidType,
            Self::TooLarge { .. } => ErrorKind::TooLarge,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Capacity(e) => e.kind(),
            Self::Ledger(e) => e.kind(),
            Self::Io(_) => ErrorKind::PersistenceFailure,
        }
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

use std::fmt;

use serde::{Deserialize, Serialize};

/// Errors raised when constructing or mutating foundation values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TypeError {
    #[error("capacity {value} out of range [{min}, {max}]")]
    OutOfRange { value: i64, min: usize, max: usize },
}

/// Stable, transport-independent classification of a failed operation.
///
/// Every crate's error type maps onto one of these; the serving layer turns
/// them into status codes and the `kind` field of error bodies.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// No file, name or field was supplied.
    MissingInput,
    /// Extension absent or not whitelisted.
    InvalidType,
    /// Exceeds the store's size ceiling.
    TooLarge,
    NotFound,
    /// Capacity outside `[1, 100]`.
    OutOfRange,
    /// Reading or writing the asset directory or a JSON document failed.
    PersistenceFailure,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MissingInput => "missing_input",
            Self::InvalidType => "invalid_type",
            Self::TooLarge => "too_large",
            Self::NotFound => "not_found",
            Self::OutOfRange => "out_of_range",
            Self::PersistenceFailure => "persistence_failure",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TypeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::OutOfRange { .. } => ErrorKind::OutOfRange,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_strings_match_serde() {
        for kind in [
            ErrorKind::MissingInput,
            ErrorKind::InvalidType,
            ErrorKind::TooLarge,
            ErrorKind::NotFound,
            ErrorKind::OutOfRange,
            ErrorKind::PersistenceFailure,
        ] {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.as_str()));
        }
    }

    #[test]
    fn out_of_range_message() {
        let err = TypeError::OutOfRange {
            value: 0,
            min: 1,
            max: 100,
        };
        assert_eq!(err.to_string(), "capacity 0 out of range [1, 100]");
        assert_eq!(err.kind(), ErrorKind::OutOfRange);
    }
}

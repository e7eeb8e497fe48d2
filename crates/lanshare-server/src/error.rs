use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use lanshare_types::{ErrorKind, TypeError};

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("{0}")]
    Store(#[from] lanshare_store::StoreError),

    #[error("{0}")]
    Ledger(#[from] lanshare_ledger::LedgerError),

    #[error("{0}")]
    Capacity(#[from] TypeError),

    /// Malformed or absent request body.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Request body rejected by the transport before reaching the store.
    #[error("upload too large: {0}")]
    PayloadTooLarge(String),

    #[error("preview not supported for {0}")]
    PreviewUnsupported(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ServerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Store(e) => e.kind(),
            Self::Ledger(e) => e.kind(),
            Self::Capacity(e) => e.kind(),
            Self::BadRequest(_) => ErrorKind::MissingInput,
            Self::PayloadTooLarge(_) => ErrorKind::TooLarge,
            Self::PreviewUnsupported(_) => ErrorKind::InvalidType,
            Self::Config(_) | Self::Io(_) | Self::Internal(_) => ErrorKind::PersistenceFailure,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self.kind() {
            ErrorKind::MissingInput
            | ErrorKind::InvalidType
            | ErrorKind::TooLarge
            | ErrorKind::OutOfRange => StatusCode::BAD_REQUEST,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::PersistenceFailure => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// JSON body returned for every failed request.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub kind: ErrorKind,
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::debug!(error = %self, "request rejected");
        }
        let body = ErrorBody {
            error: self.to_string(),
            kind: self.kind(),
        };
        (status, Json(body)).into_response()
    }
}

pub type ServerResult<T> = Result<T, ServerError>;

#[cfg(test)]
mod tests {
    use super::*;
    use lanshare_store::StoreError;

    #[test]
    fn status_mapping() {
        let not_found: ServerError = StoreError::NotFound("a.txt".into()).into();
        assert_eq!(not_found.status(), StatusCode::NOT_FOUND);

        let too_large: ServerError = StoreError::TooLarge { size: 2, limit: 1 }.into();
        assert_eq!(too_large.status(), StatusCode::BAD_REQUEST);

        let range: ServerError = TypeError::OutOfRange {
            value: 0,
            min: 1,
            max: 100,
        }
        .into();
        assert_eq!(range.kind(), ErrorKind::OutOfRange);
        assert_eq!(range.status(), StatusCode::BAD_REQUEST);

        let io: ServerError = std::io::Error::other("disk gone").into();
        assert_eq!(io.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn preview_unsupported_is_client_error() {
        let err = ServerError::PreviewUnsupported("a.zip".into());
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "preview not supported for a.zip");
    }
}

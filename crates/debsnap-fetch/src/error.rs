//! Error types for debsnap-fetch.

use std::time::Duration;

use thiserror::Error;

use crate::data::TransferErrorKind;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("not found: {url}")]
    NotFound { url: String },

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("no progress for {stalled_for:?}")]
    Timeout { stalled_for: Duration },

    #[error("partial transfer: received {received} of {expected} bytes")]
    Partial { received: u64, expected: u64 },

    #[error("HTTP error: status {status}")]
    HttpStatus { status: u16 },

    #[error("response body error: {0}")]
    Body(String),

    #[error("max attempts exceeded ({attempts} attempts): {last}")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        last: Box<FetchError>,
    },
}

impl FetchError {
    pub fn kind(&self) -> TransferErrorKind {
        match self {
            FetchError::InvalidUrl(_) => TransferErrorKind::InvalidUrl,
            FetchError::NotFound { .. } => TransferErrorKind::NotFound,
            FetchError::Connect(_) => TransferErrorKind::Connect,
            FetchError::Timeout { .. } => TransferErrorKind::Timeout,
            FetchError::Partial { .. } => TransferErrorKind::Partial,
            FetchError::HttpStatus { .. } => TransferErrorKind::Http,
            FetchError::Body(_) => TransferErrorKind::Body,
            FetchError::RetriesExhausted { .. } => TransferErrorKind::Exhausted,
        }
    }

    /// Whether another attempt may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            FetchError::Connect(_)
                | FetchError::Timeout { .. }
                | FetchError::Partial { .. }
                | FetchError::HttpStatus { .. }
                | FetchError::Body(_)
        )
    }

    /// Whether already-received bytes must be discarded before retrying.
    ///
    /// A generic HTTP error may come from a misbehaving edge cache; resuming
    /// on top of bytes it served could splice two different bodies together.
    pub fn restarts_transfer(&self) -> bool {
        matches!(self, FetchError::HttpStatus { .. })
    }

    /// HTTP status carried by this error, looking through exhaustion.
    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::NotFound { .. } => Some(404),
            FetchError::HttpStatus { status } => Some(*status),
            FetchError::RetriesExhausted { last, .. } => last.status(),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, FetchError>;

use bytes::Bytes;
use serde::Serialize;

/// Coarse reason a transfer attempt failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferErrorKind {
    InvalidUrl,
    NotFound,
    Connect,
    Timeout,
    Partial,
    Http,
    Body,
    Exhausted,
}

/// Metadata of a completed download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOutcome {
    /// Status of the response that delivered the final bytes (200 or 206).
    pub status: u16,
    /// Raw `Last-Modified` header of the most recent response carrying one.
    pub last_modified: Option<String>,
    pub bytes_received: u64,
    pub attempts: u32,
}

/// A download buffered in memory.
#[derive(Debug, Clone)]
pub struct Fetched {
    pub outcome: FetchOutcome,
    pub bytes: Bytes,
}

//! Immutable data types for fetching.
//!
//! Configuration, per-download outcomes and the error-kind tag shared with
//! callers that need to branch on why a transfer failed.

pub mod options;
pub mod outcome;

pub use options::FetchOptions;
pub use outcome::{FetchOutcome, Fetched, TransferErrorKind};

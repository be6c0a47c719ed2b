//! Polite HTTP downloading for package mirrors.
//!
//! # Architecture
//!
//! This crate follows the three-layer pattern:
//! - [`data`] - Immutable configuration and outcome types
//! - [`core`] - Pure transformations (backoff schedule, status classes) and the token bucket
//! - [`effects`] - I/O operations behind the [`HttpClient`] trait
//!
//! # Key Features
//!
//! - **Resumable**: interrupted transfers continue from the received offset via `Range`
//! - **Throttled**: a token bucket caps sustained bytes/second while reading the body
//! - **Paced**: a process-wide [`RateGovernor`] spaces requests to the origin
//! - **Stall-aware**: no forward progress within the stall window aborts the attempt

pub mod core;
pub mod data;
pub mod effects;
mod error;

pub use self::core::{StatusClass, TokenBucket, classify_status, retry_delay};
pub use data::{FetchOptions, FetchOutcome, Fetched, TransferErrorKind};
pub use effects::{
    AttemptOutcome, BoxStream, Downloader, HttpClient, HttpResponse, RateGovernor, Sink, Slot,
    TransferStats,
};

#[cfg(feature = "reqwest")]
pub use effects::ReqwestClient;

pub use error::{FetchError, Result};

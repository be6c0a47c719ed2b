//! I/O operations for fetching.
//!
//! The network sits behind [`HttpClient`]; everything above it is expressed
//! against that trait so tests can script responses.

mod downloader;
mod governor;
mod http;

pub use downloader::{Downloader, Sink};
pub use governor::{AttemptOutcome, RateGovernor, Slot, TransferStats};
pub use http::{BoxStream, HttpClient, HttpResponse};

#[cfg(feature = "reqwest")]
pub use http::ReqwestClient;

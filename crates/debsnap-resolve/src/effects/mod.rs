//! I/O side of resolution.
//!
//! Network and process access sit behind [`Inspector`], [`SnapshotService`]
//! and [`ListingSource`], so the orchestrator can be driven by test doubles.

mod inspector;
mod listing;
mod orchestrator;
mod result_cache;
mod service;
mod upstream;

pub use inspector::{ContentInspector, Inspector};
pub use listing::{ListingSource, MirrorDirectoryCache, RsyncListing};
pub use orchestrator::Orchestrator;
pub use result_cache::ResultCache;
pub use service::{MirrorResolver, SnapshotResolver};
pub use upstream::{HttpSnapshotService, SnapshotService, UpstreamError};

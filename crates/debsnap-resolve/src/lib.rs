//! Resolution of Debian package versions into content-addressed file records.
//!
//! A query for a source or binary package is answered by the authoritative
//! snapshot service when it knows the package, and otherwise by probing the
//! configured mirrors for every plausible filename.
//!
//! # Architecture
//!
//! - [`data`] - Queries, file records and the result envelope
//! - [`core`] - Candidate filenames, pool paths, completeness rules, timestamps
//! - [`effects`] - Inspector, caches, upstream client and the fallback orchestrator

pub mod config;
pub mod core;
pub mod data;
pub mod effects;
mod error;

pub use config::{ListingConfig, MirrorConfig, ResolverConfig};
pub use data::{
    ContentRecord, FileIndex, FileInfo, FileLocation, MirrorListing, PackageKind, PackageQuery, ProbeFailure,
    Resolution, ResolutionResult, ResultEntry, UpstreamPayload,
};
pub use effects::{
    ContentInspector, HttpSnapshotService, Inspector, ListingSource, MirrorDirectoryCache,
    MirrorResolver, Orchestrator, ResultCache, RsyncListing, SnapshotResolver, SnapshotService,
    UpstreamError,
};
pub use error::{Error, ListingError, Result};

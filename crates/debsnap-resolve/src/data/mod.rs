//! Immutable data types shared by every resolution stage.

mod envelope;
mod file_info;
mod listing;
mod query;

pub use envelope::{
    EnvelopeBuilder, FileIndex, FileLocation, Resolution, ResolutionResult, ResultEntry, UpstreamPayload,
};
pub use file_info::{ContentRecord, FileInfo, ProbeFailure};
pub use listing::MirrorListing;
pub use query::{PackageKind, PackageQuery};

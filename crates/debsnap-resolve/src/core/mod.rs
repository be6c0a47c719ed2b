//! Pure resolution rules: filenames, pool layout, completeness, timestamps.

mod candidates;
mod completeness;
mod rsync;
mod timestamp;

pub use candidates::{CandidateGroup, CandidateSet, NamingConvention, Role, candidates, pool_path};
pub use completeness::{BinaryVerdict, RoleSet, SourceVerdict, assess_binary, assess_source};
pub use rsync::parse_rsync_listing;
pub use timestamp::{FIRST_SEEN_FORMAT, first_seen_from_http_date};

//! Pure transformations for mirror fetching.
//!
//! Nothing here performs network I/O; the token bucket only sleeps.

mod bandwidth;
mod retry;
mod status;

pub use bandwidth::TokenBucket;
pub use retry::retry_delay;
pub use status::{StatusClass, classify_status, range_header};

//! Content hashing primitives for downloaded package files.
//!
//! Digests are computed incrementally as bytes arrive, so a file never has to
//! be held in memory to be content-addressed.
//!
//! # Example
//!
//! ```
//! use debsnap_verify::{HashAlgorithm, Hasher};
//!
//! let mut hasher = HashAlgorithm::Md5.hasher()?;
//! hasher.update(b"hello ");
//! hasher.update(b"world");
//! assert_eq!(hasher.finalize_hex(), "5eb63bbbe01eeed093cb22bb8f5acdc3");
//! # Ok::<(), debsnap_verify::Error>(())
//! ```

pub use self::algorithm::HashAlgorithm;
pub use self::error::{Error, Result};
pub use self::hasher::{AnyHasher, Hasher};

#[cfg(feature = "md5")]
pub use self::hasher::Md5Hasher;

#[cfg(feature = "sha256")]
pub use self::hasher::Sha256Hasher;

mod algorithm;
mod error;
mod hasher;

use serde::{Deserialize, Serialize};

use crate::{AnyHasher, Error, Result};

/// Digest used to content-address downloaded files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    #[default]
    Md5,
    Sha256,
}

impl HashAlgorithm {
    /// Digest length in bytes.
    pub fn digest_length(&self) -> usize {
        match self {
            HashAlgorithm::Md5 => 16,
            HashAlgorithm::Sha256 => 32,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HashAlgorithm::Md5 => "md5",
            HashAlgorithm::Sha256 => "sha256",
        }
    }

    /// Fresh accumulator for this algorithm.
    ///
    /// Fails with [`Error::Disabled`] if the algorithm's cargo feature is off.
    pub fn hasher(&self) -> Result<AnyHasher> {
        match self {
            #[cfg(feature = "md5")]
            HashAlgorithm::Md5 => Ok(AnyHasher::Md5(crate::Md5Hasher::new())),
            #[cfg(feature = "sha256")]
            HashAlgorithm::Sha256 => Ok(AnyHasher::Sha256(crate::Sha256Hasher::new())),
            #[allow(unreachable_patterns)]
            other => Err(Error::Disabled(other.as_str())),
        }
    }
}

impl std::fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for HashAlgorithm {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "md5" => Ok(HashAlgorithm::Md5),
            "sha256" | "sha-256" => Ok(HashAlgorithm::Sha256),
            other => Err(Error::UnknownAlgorithm(other.to_string())),
        }
    }
}

use std::time::Duration;

use debsnap_verify::HashAlgorithm;
use serde::Deserialize;

use crate::core::NamingConvention;

/// One fallback mirror.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MirrorConfig {
    /// HTTP root the pool paths are appended to.
    pub base_url: String,
    /// Label reported as `archive_name` in the envelope.
    #[serde(default = "default_archive_name")]
    pub archive_name: String,
}

impl MirrorConfig {
    pub fn new(base_url: impl Into<String>, archive_name: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            archive_name: archive_name.into(),
        }
    }

    /// URL of `file` inside the mirror-relative `dir`.
    pub fn file_url(&self, dir: &str, file: &str) -> String {
        format!(
            "{}/{}/{}",
            self.base_url.trim_end_matches('/'),
            dir.trim_matches('/'),
            file
        )
    }
}

fn default_archive_name() -> String { "debian".to_string() }

/// Remote listing used to locate binaries on the first mirror.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ListingConfig {
    /// rsync URL of the mirror's pool directory.
    pub url: String,
    /// Prepended to every listed path so it becomes mirror-relative.
    ///
    /// Default: `pool/`
    #[serde(default = "default_listing_prefix")]
    pub prefix: String,
    /// Default: `rsync`
    #[serde(default = "default_listing_program")]
    pub program: String,
}

fn default_listing_prefix() -> String { "pool/".to_string() }

fn default_listing_program() -> String { "rsync".to_string() }

/// Resolver settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Default: `https://snapshot.debian.org`
    pub snapshot_url: String,

    /// Whole-request budget for the snapshot service.
    ///
    /// Default: 30
    pub upstream_timeout_secs: u64,

    /// Probed in order; the first complete answer wins.
    pub mirrors: Vec<MirrorConfig>,

    pub listing: Option<ListingConfig>,

    /// Default: 300
    pub listing_ttl_secs: u64,

    /// Default: 3600
    pub result_ttl_secs: u64,

    /// Entries kept before expired ones are swept.
    ///
    /// Default: 4096
    pub result_cache_capacity: usize,

    /// Default: `["amd64", "all"]`
    pub architectures: Vec<String>,

    /// Default: none
    pub revision_suffix: Option<String>,

    /// Default: `md5`
    pub hash: HashAlgorithm,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            snapshot_url: "https://snapshot.debian.org".to_string(),
            upstream_timeout_secs: 30,
            mirrors: vec![MirrorConfig::new("https://deb.qubes-os.org/r4.1/vm", "debian")],
            listing: None,
            listing_ttl_secs: 300,
            result_ttl_secs: 3600,
            result_cache_capacity: 4096,
            architectures: NamingConvention::default().architectures,
            revision_suffix: None,
            hash: HashAlgorithm::default(),
        }
    }
}

impl ResolverConfig {
    pub fn upstream_timeout(&self) -> Duration { Duration::from_secs(self.upstream_timeout_secs) }

    pub fn listing_ttl(&self) -> Duration { Duration::from_secs(self.listing_ttl_secs) }

    pub fn result_ttl(&self) -> Duration { Duration::from_secs(self.result_ttl_secs) }

    pub fn naming(&self) -> NamingConvention {
        NamingConvention::default()
            .revision_suffix(self.revision_suffix.clone().unwrap_or_default())
            .architectures(self.architectures.iter().cloned())
    }
}

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::error::{Error, Result};

static PACKAGE_NAME: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-z0-9][a-z0-9+.\-]+$").unwrap());
static PACKAGE_VERSION: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z0-9.+~:\-]+$").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PackageKind {
    Source,
    Binary,
}

impl fmt::Display for PackageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PackageKind::Source => f.write_str("source"),
            PackageKind::Binary => f.write_str("binary"),
        }
    }
}

/// One resolution request.
///
/// Name and version come from untrusted callers; construction rejects
/// anything that could escape filename templating.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PackageQuery {
    kind: PackageKind,
    name: String,
    version: String,
}

impl PackageQuery {
    pub fn new(kind: PackageKind, name: impl Into<String>, version: impl Into<String>) -> Result<Self> {
        let name = name.into();
        let version = version.into();

        if !PACKAGE_NAME.is_match(&name) {
            return Err(Error::InvalidQuery(format!("bad package name '{name}'")));
        }
        if !PACKAGE_VERSION.is_match(&version) || version.contains("..") {
            return Err(Error::InvalidQuery(format!("bad version '{version}'")));
        }

        Ok(Self { kind, name, version })
    }

    pub fn source(name: impl Into<String>, version: impl Into<String>) -> Result<Self> {
        Self::new(PackageKind::Source, name, version)
    }

    pub fn binary(name: impl Into<String>, version: impl Into<String>) -> Result<Self> {
        Self::new(PackageKind::Binary, name, version)
    }

    pub fn kind(&self) -> PackageKind { self.kind }

    pub fn name(&self) -> &str { &self.name }

    /// Version exactly as queried, epoch included.
    pub fn version(&self) -> &str { &self.version }

    /// Version as it appears in archive filenames (epoch stripped).
    pub fn file_version(&self) -> &str {
        match self.version.split_once(':') {
            Some((epoch, rest)) if !epoch.is_empty() && epoch.bytes().all(|b| b.is_ascii_digit()) => rest,
            _ => &self.version,
        }
    }

    /// Upstream portion of the version: everything before the first `-`.
    pub fn upstream_version(&self) -> &str {
        let version = self.file_version();
        version.split_once('-').map_or(version, |(upstream, _)| upstream)
    }
}

impl fmt::Display for PackageQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}/{}", self.kind, self.name, self.version)
    }
}

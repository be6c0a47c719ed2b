use std::ops::Index;

use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

use crate::core::Role;
use crate::data::{FileInfo, PackageKind, PackageQuery};

const COMMENT: &str = "foo";

/// One location a content hash was observed at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileLocation {
    pub name: String,
    pub archive_name: String,
    /// Root-relative pool directory, with a leading `/`.
    pub path: String,
    pub first_seen: String,
    pub size: u64,
}

/// Entry of the ordered `result` index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResultEntry {
    pub hash: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub architecture: Option<String>,
    #[serde(skip)]
    pub role: Role,
}

/// The `fileinfo` mapping, keeping hashes in the order they were first added.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileIndex {
    entries: Vec<(String, Vec<FileLocation>)>,
}

impl FileIndex {
    pub fn get(&self, hash: &str) -> Option<&[FileLocation]> {
        self.entries
            .iter()
            .find(|(key, _)| key == hash)
            .map(|(_, locations)| locations.as_slice())
    }

    pub fn contains_key(&self, hash: &str) -> bool { self.get(hash).is_some() }

    pub fn keys(&self) -> impl Iterator<Item = &str> { self.entries.iter().map(|(key, _)| key.as_str()) }

    pub fn values(&self) -> impl Iterator<Item = &[FileLocation]> {
        self.entries.iter().map(|(_, locations)| locations.as_slice())
    }

    pub fn len(&self) -> usize { self.entries.len() }

    pub fn is_empty(&self) -> bool { self.entries.is_empty() }

    fn push(&mut self, hash: &str, location: FileLocation) {
        match self.entries.iter_mut().find(|(key, _)| key == hash) {
            Some((_, locations)) => locations.push(location),
            None => self.entries.push((hash.to_string(), vec![location])),
        }
    }
}

impl Index<&str> for FileIndex {
    type Output = [FileLocation];

    fn index(&self, hash: &str) -> &[FileLocation] {
        self.get(hash)
            .unwrap_or_else(|| panic!("no file info for hash {hash}"))
    }
}

impl Serialize for FileIndex {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (hash, locations) in &self.entries {
            map.serialize_entry(hash, locations)?;
        }
        map.end()
    }
}

/// Final envelope of a mirror resolution.
///
/// Built only through [`EnvelopeBuilder`], which keeps every hash of
/// [`entries`](Self::entries) keyed in [`fileinfo`](Self::fileinfo) and
/// the other way round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionResult {
    kind: PackageKind,
    name: String,
    version: String,
    entries: Vec<ResultEntry>,
    fileinfo: FileIndex,
}

impl ResolutionResult {
    pub fn kind(&self) -> PackageKind { self.kind }

    pub fn name(&self) -> &str { &self.name }

    pub fn version(&self) -> &str { &self.version }

    pub fn entries(&self) -> &[ResultEntry] { &self.entries }

    pub fn fileinfo(&self) -> &FileIndex { &self.fileinfo }

    pub fn roles(&self) -> impl Iterator<Item = Role> + '_ {
        self.entries.iter().map(|entry| entry.role)
    }
}

impl Serialize for ResolutionResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(5))?;
        match self.kind {
            PackageKind::Source => {
                map.serialize_entry("package", &self.name)?;
                map.serialize_entry("version", &self.version)?;
            }
            PackageKind::Binary => {
                map.serialize_entry("binary_version", &self.version)?;
                map.serialize_entry("binary", &self.name)?;
            }
        }
        map.serialize_entry("_comment", COMMENT)?;
        map.serialize_entry("result", &self.entries)?;
        map.serialize_entry("fileinfo", &self.fileinfo)?;
        map.end()
    }
}

/// Accumulates found files into a [`ResolutionResult`].
pub struct EnvelopeBuilder {
    result: ResolutionResult,
    archive_name: String,
}

impl EnvelopeBuilder {
    pub fn new(query: &PackageQuery, archive_name: impl Into<String>) -> Self {
        Self {
            result: ResolutionResult {
                kind: query.kind(),
                name: query.name().to_string(),
                version: query.version().to_string(),
                entries: Vec::new(),
                fileinfo: FileIndex::default(),
            },
            archive_name: archive_name.into(),
        }
    }

    /// Record a found file. Records without content are ignored.
    pub fn add(&mut self, role: Role, architecture: Option<&str>, path: &str, info: &FileInfo) -> &mut Self {
        let Some(content) = info.content() else {
            return self;
        };

        self.result.entries.push(ResultEntry {
            hash: content.hash.clone(),
            architecture: architecture.map(str::to_string),
            role,
        });
        self.result.fileinfo.push(
            &content.hash,
            FileLocation {
                name: info.source_filename.clone(),
                archive_name: self.archive_name.clone(),
                path: root_relative(path),
                first_seen: content.first_seen.clone(),
                size: content.size,
            },
        );
        self
    }

    pub fn is_empty(&self) -> bool { self.result.entries.is_empty() }

    pub fn build(self) -> ResolutionResult { self.result }
}

fn root_relative(path: &str) -> String {
    let trimmed = path.trim_end_matches('/');
    if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    }
}

/// Payload adopted verbatim from the snapshot service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamPayload {
    pub status: u16,
    pub body: String,
}

/// Terminal outcome of resolving one [`PackageQuery`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Upstream(UpstreamPayload),
    Complete(ResolutionResult),
    /// Source package with only a native tarball beside its `.dsc`.
    PartialComplete(ResolutionResult),
    NotFound,
}

impl Resolution {
    pub fn envelope(&self) -> Option<&ResolutionResult> {
        match self {
            Resolution::Complete(result) | Resolution::PartialComplete(result) => Some(result),
            Resolution::Upstream(_) | Resolution::NotFound => None,
        }
    }

    pub fn is_not_found(&self) -> bool { matches!(self, Resolution::NotFound) }
}

use debsnap_fetch::TransferErrorKind;

/// Content facts about one successfully downloaded file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentRecord {
    pub hash: String,
    pub first_seen: String,
    pub size: u64,
}

/// Why a candidate produced no content record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeFailure {
    Transfer(TransferErrorKind),
    /// The origin's `Last-Modified` was missing or unparseable.
    BadTimestamp,
}

/// Result of inspecting one candidate URL.
///
/// Hash, first-seen and size live together in [`ContentRecord`], so they are
/// present or absent as a unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileInfo {
    /// Last HTTP status observed, `0` when no response head was received.
    pub status_code: u16,
    pub source_filename: String,
    pub url: String,
    content: Option<ContentRecord>,
    failure: Option<ProbeFailure>,
}

impl FileInfo {
    pub fn found(status_code: u16, filename: &str, url: &str, content: ContentRecord) -> Self {
        debug_assert!(matches!(status_code, 200 | 206));
        Self {
            status_code,
            source_filename: filename.to_string(),
            url: url.to_string(),
            content: Some(content),
            failure: None,
        }
    }

    pub fn absent(status_code: u16, filename: &str, url: &str, failure: ProbeFailure) -> Self {
        Self {
            status_code,
            source_filename: filename.to_string(),
            url: url.to_string(),
            content: None,
            failure: Some(failure),
        }
    }

    pub fn content(&self) -> Option<&ContentRecord> { self.content.as_ref() }

    pub fn failure(&self) -> Option<ProbeFailure> { self.failure }

    pub fn content_hash(&self) -> Option<&str> { self.content.as_ref().map(|c| c.hash.as_str()) }

    pub fn first_seen(&self) -> Option<&str> { self.content.as_ref().map(|c| c.first_seen.as_str()) }

    pub fn size_bytes(&self) -> Option<u64> { self.content.as_ref().map(|c| c.size) }

    pub fn is_found(&self) -> bool { self.content.is_some() }

    /// Definitive absence (404) rather than a failed inspection.
    pub fn is_not_found(&self) -> bool {
        matches!(self.failure, Some(ProbeFailure::Transfer(TransferErrorKind::NotFound)))
    }

    /// The mirror could not be reached reliably for this candidate.
    pub fn is_transport_failure(&self) -> bool {
        matches!(
            self.failure,
            Some(ProbeFailure::Transfer(kind))
                if !matches!(kind, TransferErrorKind::NotFound | TransferErrorKind::InvalidUrl)
        )
    }
}

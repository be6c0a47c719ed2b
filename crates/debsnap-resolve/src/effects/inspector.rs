use std::future::Future;
use std::sync::Arc;

use debsnap_fetch::{Downloader, FetchError, HttpClient, Sink};
use debsnap_verify::{AnyHasher, HashAlgorithm, Hasher};
use tracing::debug;

use crate::core::first_seen_from_http_date;
use crate::data::{ContentRecord, FileInfo, ProbeFailure};
use crate::error::Result;

/// Turns a candidate URL into a [`FileInfo`].
///
/// Always yields a record; failures are carried in
/// [`FileInfo::failure`] together with the last observed status.
pub trait Inspector: Send + Sync {
    fn inspect(&self, url: &str, filename: &str) -> impl Future<Output = FileInfo> + Send;
}

impl<T: Inspector> Inspector for Arc<T> {
    fn inspect(&self, url: &str, filename: &str) -> impl Future<Output = FileInfo> + Send {
        (**self).inspect(url, filename)
    }
}

/// Streams each download through a hasher; file contents are never kept.
pub struct ContentInspector<C: HttpClient> {
    downloader: Arc<Downloader<C>>,
    algorithm: HashAlgorithm,
    fresh: AnyHasher,
}

impl<C: HttpClient> ContentInspector<C> {
    /// Fails if `algorithm` was compiled out of `debsnap-verify`.
    pub fn new(downloader: Arc<Downloader<C>>, algorithm: HashAlgorithm) -> Result<Self> {
        let fresh = algorithm.hasher()?;
        Ok(Self {
            downloader,
            algorithm,
            fresh,
        })
    }

    pub fn downloader(&self) -> &Arc<Downloader<C>> { &self.downloader }

    pub fn algorithm(&self) -> HashAlgorithm { self.algorithm }
}

impl<C: HttpClient> Inspector for ContentInspector<C> {
    async fn inspect(&self, url: &str, filename: &str) -> FileInfo {
        let mut sink = HashSink::new(self.fresh.clone());

        let outcome = match self.downloader.fetch_into(url, &mut sink).await {
            Ok(outcome) => outcome,
            Err(e) => {
                debug!(url = %url, error = %e, "candidate unavailable");
                return FileInfo::absent(status_of(&e), filename, url, ProbeFailure::Transfer(e.kind()));
            }
        };

        let Some(first_seen) = outcome.last_modified.as_deref().and_then(first_seen_from_http_date) else {
            debug!(
                url = %url,
                last_modified = ?outcome.last_modified,
                "missing or unparseable Last-Modified, treating candidate as absent"
            );
            return FileInfo::absent(outcome.status, filename, url, ProbeFailure::BadTimestamp);
        };

        FileInfo::found(
            outcome.status,
            filename,
            url,
            ContentRecord {
                hash: sink.finish(),
                first_seen,
                size: outcome.bytes_received,
            },
        )
    }
}

fn status_of(error: &FetchError) -> u16 {
    error.status().unwrap_or(0)
}

/// [`Sink`] that hashes instead of buffering.
struct HashSink {
    fresh: AnyHasher,
    hasher: AnyHasher,
}

impl HashSink {
    fn new(fresh: AnyHasher) -> Self {
        Self {
            hasher: fresh.clone(),
            fresh,
        }
    }

    fn finish(self) -> String { self.hasher.finalize_hex() }
}

impl Sink for HashSink {
    fn write(&mut self, chunk: &[u8]) { self.hasher.update(chunk); }

    fn reset(&mut self) { self.hasher = self.fresh.clone(); }
}

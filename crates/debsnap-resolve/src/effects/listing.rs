use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::core::parse_rsync_listing;
use crate::data::MirrorListing;
use crate::error::ListingError;

/// Remote enumeration of every file on a mirror.
pub trait ListingSource: Send + Sync + 'static {
    fn fetch(&self) -> impl Future<Output = Result<Vec<String>, ListingError>> + Send;
}

/// Lists a mirror with `rsync --list-only --recursive`.
#[derive(Debug, Clone)]
pub struct RsyncListing {
    url: String,
    prefix: String,
    program: String,
}

impl RsyncListing {
    pub fn new(url: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            prefix: prefix.into(),
            program: "rsync".to_string(),
        }
    }

    #[must_use]
    pub fn program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }
}

impl ListingSource for RsyncListing {
    async fn fetch(&self) -> Result<Vec<String>, ListingError> {
        debug!(url = %self.url, program = %self.program, "listing mirror");
        let output = tokio::process::Command::new(&self.program)
            .args(["--list-only", "--recursive", &self.url])
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| ListingError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(ListingError::Failed {
                url: self.url.clone(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(parse_rsync_listing(&String::from_utf8_lossy(&output.stdout), &self.prefix))
    }
}

/// Memoized [`MirrorListing`], refreshed at most once per `ttl`.
///
/// A stale listing is served while one background refresh replaces it.
/// Only the very first population blocks callers, and only that one
/// reports a failed listing; an empty listing counts as a failure.
pub struct MirrorDirectoryCache<L: ListingSource> {
    inner: Arc<CacheInner<L>>,
}

struct CacheInner<L> {
    source: L,
    ttl: Duration,
    current: RwLock<Option<Arc<MirrorListing>>>,
    refreshing: AtomicBool,
    populate: tokio::sync::Mutex<()>,
}

impl<L: ListingSource> Clone for MirrorDirectoryCache<L> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<L: ListingSource> MirrorDirectoryCache<L> {
    pub fn new(source: L, ttl: Duration) -> Self {
        Self {
            inner: Arc::new(CacheInner {
                source,
                ttl,
                current: RwLock::new(None),
                refreshing: AtomicBool::new(false),
                populate: tokio::sync::Mutex::new(()),
            }),
        }
    }

    pub async fn list(&self) -> Result<Arc<MirrorListing>, ListingError> {
        if let Some(listing) = self.inner.snapshot() {
            if listing.is_stale(self.inner.ttl) {
                self.spawn_refresh();
            }
            return Ok(listing);
        }

        let _populating = self.inner.populate.lock().await;
        // Another caller may have finished populating while we waited.
        if let Some(listing) = self.inner.snapshot() {
            return Ok(listing);
        }
        self.inner.refresh().await
    }

    fn spawn_refresh(&self) {
        if self
            .inner
            .refreshing
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return;
        }

        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            if let Err(e) = inner.refresh().await {
                warn!(error = %e, "mirror listing refresh failed, keeping stale listing");
            }
            inner.refreshing.store(false, Ordering::Release);
        });
    }
}

impl<L: ListingSource> CacheInner<L> {
    fn snapshot(&self) -> Option<Arc<MirrorListing>> {
        self.current
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    async fn refresh(&self) -> Result<Arc<MirrorListing>, ListingError> {
        let paths = self.source.fetch().await?;
        if paths.is_empty() {
            return Err(ListingError::Empty);
        }

        let listing = Arc::new(MirrorListing::new(paths));
        info!(files = listing.len(), "mirror listing refreshed");
        *self
            .current
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(Arc::clone(&listing));
        Ok(listing)
    }
}

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::OnceCell;
use tokio::time::Instant;
use tracing::debug;

use crate::data::{PackageQuery, Resolution};
use crate::error::Result;

struct Cached {
    resolution: Arc<Resolution>,
    expires_at: Instant,
}

impl Cached {
    fn is_expired(&self, now: Instant) -> bool { now >= self.expires_at }
}

type Slot = Arc<OnceCell<Cached>>;

/// Time-bound memo of finished resolutions, keyed by query.
///
/// Concurrent callers for the same query share one computation. Every
/// resolved value is cached, `NotFound` included; errors are not.
/// Expiry is checked on lookup. Once `capacity` is reached, expired and
/// abandoned slots are swept first, then the entries closest to expiry.
pub struct ResultCache {
    capacity: usize,
    entries: Mutex<HashMap<PackageQuery, Slot>>,
}

impl ResultCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn len(&self) -> usize { self.lock().len() }

    pub fn is_empty(&self) -> bool { self.len() == 0 }

    pub async fn get_or_compute<F, Fut>(&self, query: &PackageQuery, compute: F, ttl: Duration) -> Result<Arc<Resolution>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Resolution>>,
    {
        let slot = self.slot(query);
        let computed = slot
            .get_or_try_init(|| async {
                let resolution = compute().await?;
                Ok::<_, crate::Error>(Cached {
                    resolution: Arc::new(resolution),
                    expires_at: Instant::now() + ttl,
                })
            })
            .await;

        match computed {
            Ok(cached) => Ok(Arc::clone(&cached.resolution)),
            Err(e) => {
                self.discard(query, &slot);
                Err(e)
            }
        }
    }

    /// Live slot for `query`, replacing an expired one.
    fn slot(&self, query: &PackageQuery) -> Slot {
        let now = Instant::now();
        let mut entries = self.lock();

        if let Some(slot) = entries.get(query) {
            match slot.get() {
                Some(cached) if cached.is_expired(now) => {
                    debug!(query = %query, "cached resolution expired");
                }
                _ => return Arc::clone(slot),
            }
        }

        entries.remove(query);
        if entries.len() >= self.capacity {
            self.evict(&mut entries, now);
        }

        let slot = Arc::new(OnceCell::new());
        entries.insert(query.clone(), Arc::clone(&slot));
        slot
    }

    /// Make room for one more entry.
    fn evict(&self, entries: &mut HashMap<PackageQuery, Slot>, now: Instant) {
        let before = entries.len();
        // An empty slot only the map still holds was abandoned mid-computation.
        entries.retain(|_, slot| match slot.get() {
            Some(cached) => !cached.is_expired(now),
            None => Arc::strong_count(slot) > 1,
        });

        if entries.len() >= self.capacity {
            let mut live: Vec<(Instant, PackageQuery)> = entries
                .iter()
                .filter_map(|(query, slot)| slot.get().map(|cached| (cached.expires_at, query.clone())))
                .collect();
            live.sort_by_key(|(expires_at, _)| *expires_at);

            let excess = entries.len() + 1 - self.capacity;
            for (_, query) in live.into_iter().take(excess) {
                entries.remove(&query);
            }
        }

        debug!(evicted = before - entries.len(), remaining = entries.len(), "evicted cached resolutions");
    }

    /// Drop `slot` after a failed computation unless another caller is
    /// still waiting on it.
    fn discard(&self, query: &PackageQuery, slot: &Slot) {
        let mut entries = self.lock();
        let abandoned = entries
            .get(query)
            .is_some_and(|current| Arc::ptr_eq(current, slot) && current.get().is_none());
        // One reference from the map, one from this caller.
        if abandoned && Arc::strong_count(slot) <= 2 {
            entries.remove(query);
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<PackageQuery, Slot>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

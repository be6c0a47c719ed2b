use std::sync::Arc;
use std::time::Duration;

use debsnap_fetch::{Downloader, FetchOptions, RateGovernor, ReqwestClient};

use crate::config::ResolverConfig;
use crate::data::{PackageQuery, Resolution};
use crate::effects::inspector::{ContentInspector, Inspector};
use crate::effects::listing::{ListingSource, MirrorDirectoryCache, RsyncListing};
use crate::effects::orchestrator::Orchestrator;
use crate::effects::result_cache::ResultCache;
use crate::effects::upstream::{HttpSnapshotService, SnapshotService};
use crate::error::Result;

/// Production resolver stack.
pub type MirrorResolver = SnapshotResolver<HttpSnapshotService, ContentInspector<ReqwestClient>, RsyncListing>;

/// Cached front of an [`Orchestrator`].
pub struct SnapshotResolver<U, I, L: ListingSource = RsyncListing> {
    orchestrator: Orchestrator<U, I, L>,
    cache: ResultCache,
    ttl: Duration,
}

impl<U, I, L> SnapshotResolver<U, I, L>
where
    U: SnapshotService,
    I: Inspector,
    L: ListingSource,
{
    pub fn new(orchestrator: Orchestrator<U, I, L>, cache: ResultCache, ttl: Duration) -> Self {
        Self {
            orchestrator,
            cache,
            ttl,
        }
    }

    pub fn cache(&self) -> &ResultCache { &self.cache }

    pub async fn resolve(&self, query: &PackageQuery) -> Result<Arc<Resolution>> {
        self.cache
            .get_or_compute(query, || self.orchestrator.resolve(query), self.ttl)
            .await
    }

    pub async fn resolve_source(&self, name: &str, version: &str) -> Result<Arc<Resolution>> {
        let query = PackageQuery::source(name, version)?;
        self.resolve(&query).await
    }

    pub async fn resolve_binary(&self, name: &str, version: &str) -> Result<Arc<Resolution>> {
        let query = PackageQuery::binary(name, version)?;
        self.resolve(&query).await
    }
}

impl MirrorResolver {
    /// Wire the HTTP, hashing and listing stack from configuration.
    ///
    /// Every mirror download goes through `governor`.
    pub fn from_config(config: &ResolverConfig, fetch: FetchOptions, governor: Arc<RateGovernor>) -> Result<Self> {
        let client = ReqwestClient::new(fetch.connect_timeout())?;
        let downloader = Arc::new(Downloader::with_governor(client, fetch, governor));
        let inspector = ContentInspector::new(downloader, config.hash)?;
        let upstream = HttpSnapshotService::new(config.snapshot_url.as_str(), config.upstream_timeout())?;

        let mut orchestrator = Orchestrator::new(upstream, inspector, config.mirrors.clone(), config.naming());
        if let Some(listing) = &config.listing {
            let source = RsyncListing::new(listing.url.as_str(), listing.prefix.as_str()).program(listing.program.as_str());
            orchestrator = orchestrator.with_listing(MirrorDirectoryCache::new(source, config.listing_ttl()));
        }

        Ok(Self::new(
            orchestrator,
            ResultCache::new(config.result_cache_capacity),
            config.result_ttl(),
        ))
    }
}

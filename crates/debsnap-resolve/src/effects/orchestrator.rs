use std::sync::Arc;

use futures_util::future::join_all;
use tracing::{debug, info, warn};

use crate::config::MirrorConfig;
use crate::core::{
    BinaryVerdict, CandidateGroup, CandidateSet, NamingConvention, Role, RoleSet, SourceVerdict, assess_binary,
    assess_source, candidates,
};
use crate::data::{EnvelopeBuilder, FileInfo, MirrorListing, PackageKind, PackageQuery, Resolution};
use crate::effects::inspector::Inspector;
use crate::effects::listing::{ListingSource, MirrorDirectoryCache, RsyncListing};
use crate::effects::upstream::{SnapshotService, UpstreamError};
use crate::error::{Error, Result};

/// Result of walking one role's candidates.
#[derive(Debug, Default)]
struct RoleProbe {
    hit: Option<FileInfo>,
    /// First candidate URL the mirror failed to serve (as opposed to 404).
    failed: Option<String>,
}

impl RoleProbe {
    fn found(&self) -> bool { self.hit.is_some() }
}

enum MirrorOutcome {
    Resolved(Resolution),
    Missing,
    Unreachable(String),
}

/// Upstream first, then each mirror in turn.
///
/// The directory listing, when configured, belongs to the first mirror and
/// is used for binary queries only.
pub struct Orchestrator<U, I, L: ListingSource = RsyncListing> {
    upstream: U,
    inspector: I,
    mirrors: Vec<MirrorConfig>,
    listing: Option<MirrorDirectoryCache<L>>,
    naming: NamingConvention,
}

impl<U, I, L> Orchestrator<U, I, L>
where
    U: SnapshotService,
    I: Inspector,
    L: ListingSource,
{
    pub fn new(upstream: U, inspector: I, mirrors: Vec<MirrorConfig>, naming: NamingConvention) -> Self {
        Self {
            upstream,
            inspector,
            mirrors,
            listing: None,
            naming,
        }
    }

    #[must_use]
    pub fn with_listing(mut self, listing: MirrorDirectoryCache<L>) -> Self {
        self.listing = Some(listing);
        self
    }

    pub fn naming(&self) -> &NamingConvention { &self.naming }

    pub async fn resolve(&self, query: &PackageQuery) -> Result<Resolution> {
        match self.upstream.lookup(query).await {
            Ok(payload) => {
                info!(query = %query, status = payload.status, "resolved by snapshot service");
                return Ok(Resolution::Upstream(payload));
            }
            Err(UpstreamError::NotFound) => {
                debug!(query = %query, "snapshot service miss, probing mirrors");
            }
            Err(e @ UpstreamError::Unavailable(_)) => {
                warn!(query = %query, error = %e, "snapshot service unavailable, probing mirrors");
            }
        }

        let set = candidates(query, &self.naming);
        let mut unreachable = None;

        for (index, mirror) in self.mirrors.iter().enumerate() {
            let outcome = match query.kind() {
                PackageKind::Source => self.probe_source(query, &set, mirror).await,
                PackageKind::Binary => self.probe_binary(query, &set, mirror, index == 0).await,
            };
            match outcome {
                MirrorOutcome::Resolved(resolution) => {
                    info!(query = %query, mirror = %mirror.base_url, "resolved from mirror");
                    return Ok(resolution);
                }
                MirrorOutcome::Missing => {
                    debug!(query = %query, mirror = %mirror.base_url, "not on mirror");
                }
                MirrorOutcome::Unreachable(url) => {
                    warn!(query = %query, mirror = %mirror.base_url, url = %url, "mirror kept failing");
                    unreachable.get_or_insert(url);
                }
            }
        }

        match unreachable {
            Some(url) => Err(Error::ExhaustedRetries { url }),
            None => {
                info!(query = %query, "not found");
                Ok(Resolution::NotFound)
            }
        }
    }

    async fn probe_source(&self, query: &PackageQuery, set: &CandidateSet, mirror: &MirrorConfig) -> MirrorOutcome {
        let dir = set.pool_path.as_str();
        let (dsc, orig, debian) = tokio::join!(
            self.probe_role(mirror, dir, set.group(Role::Dsc)),
            self.probe_role(mirror, dir, set.group(Role::Orig)),
            self.probe_role(mirror, dir, set.group(Role::Debian)),
        );
        let native = if orig.found() || debian.found() {
            RoleProbe::default()
        } else {
            self.probe_role(mirror, dir, set.group(Role::Native)).await
        };

        let probes = [(Role::Dsc, &dsc), (Role::Orig, &orig), (Role::Debian, &debian), (Role::Native, &native)];
        let verdict = assess_source(RoleSet {
            dsc: dsc.found(),
            orig: orig.found(),
            debian: debian.found(),
            native: native.found(),
        });

        let missing: Vec<Role> = match &verdict {
            SourceVerdict::Complete | SourceVerdict::NativeOnly => {
                let mut builder = EnvelopeBuilder::new(query, &mirror.archive_name);
                for role in verdict.roles() {
                    let hit = probes
                        .iter()
                        .find(|(r, _)| r == role)
                        .and_then(|(_, probe)| probe.hit.as_ref());
                    if let Some(info) = hit {
                        builder.add(*role, None, dir, info);
                    }
                }
                let result = builder.build();
                return MirrorOutcome::Resolved(if verdict == SourceVerdict::Complete {
                    Resolution::Complete(result)
                } else {
                    Resolution::PartialComplete(result)
                });
            }
            SourceVerdict::Inconsistent { missing } => missing.clone(),
            SourceVerdict::Absent => probes.iter().map(|(role, _)| *role).collect(),
        };

        if let Some(url) = probes
            .iter()
            .filter(|(role, _)| missing.contains(role))
            .find_map(|(_, probe)| probe.failed.clone())
        {
            return MirrorOutcome::Unreachable(url);
        }

        if let SourceVerdict::Inconsistent { missing } = verdict {
            warn!(
                query = %query,
                mirror = %mirror.base_url,
                missing = ?missing,
                "no consistent file set, discarding partial match"
            );
        }
        MirrorOutcome::Missing
    }

    async fn probe_binary(
        &self,
        query: &PackageQuery,
        set: &CandidateSet,
        mirror: &MirrorConfig,
        use_listing: bool,
    ) -> MirrorOutcome {
        let listing = match (&self.listing, use_listing) {
            (Some(cache), true) => match cache.list().await {
                Ok(listing) => Some(listing),
                Err(e) => {
                    warn!(error = %e, "mirror listing unavailable, probing pool directly");
                    None
                }
            },
            _ => None,
        };

        let probes = join_all(
            set.binaries()
                .map(|group| self.probe_binary_group(mirror, &set.pool_path, group, listing.as_ref())),
        )
        .await;

        match assess_binary(probes.iter().map(|(_, probe)| probe.found())) {
            BinaryVerdict::Complete => {
                let mut builder = EnvelopeBuilder::new(query, &mirror.archive_name);
                for (group, (dir, probe)) in set.binaries().zip(&probes) {
                    if let Some(info) = &probe.hit {
                        builder.add(Role::Binary, group.architecture.as_deref(), dir, info);
                    }
                }
                MirrorOutcome::Resolved(Resolution::Complete(builder.build()))
            }
            BinaryVerdict::Absent => match probes.into_iter().find_map(|(_, probe)| probe.failed) {
                Some(url) => MirrorOutcome::Unreachable(url),
                None => MirrorOutcome::Missing,
            },
        }
    }

    /// Probe one architecture, locating it through the listing when present.
    ///
    /// Binaries live in their source package's pool directory, so a listing
    /// hit's directory replaces the one derived from the binary name.
    async fn probe_binary_group(
        &self,
        mirror: &MirrorConfig,
        pool_path: &str,
        group: &CandidateGroup,
        listing: Option<&Arc<MirrorListing>>,
    ) -> (String, RoleProbe) {
        let Some(listing) = listing else {
            return (pool_path.to_string(), self.probe_role(mirror, pool_path, Some(group)).await);
        };

        for filename in &group.filenames {
            let Some(path) = listing.find(filename) else {
                continue;
            };
            let dir = path.rsplit_once('/').map_or("", |(dir, _)| dir).to_string();
            let probe = self.probe_one(mirror, &dir, filename).await;
            return (dir, probe);
        }

        debug!(architecture = ?group.architecture, "not in mirror listing");
        (pool_path.to_string(), RoleProbe::default())
    }

    /// Try a role's candidates in order; the first populated record wins.
    async fn probe_role(&self, mirror: &MirrorConfig, dir: &str, group: Option<&CandidateGroup>) -> RoleProbe {
        let mut probe = RoleProbe::default();
        let Some(group) = group else {
            return probe;
        };

        for filename in &group.filenames {
            let attempt = self.probe_one(mirror, dir, filename).await;
            if attempt.found() {
                return attempt;
            }
            if probe.failed.is_none() {
                probe.failed = attempt.failed;
            }
        }
        probe
    }

    async fn probe_one(&self, mirror: &MirrorConfig, dir: &str, filename: &str) -> RoleProbe {
        let url = mirror.file_url(dir, filename);
        let info = self.inspector.inspect(&url, filename).await;
        debug!(url = %url, status = info.status_code, found = info.is_found(), "probed candidate");

        if info.is_found() {
            RoleProbe {
                hit: Some(info),
                failed: None,
            }
        } else if info.is_transport_failure() {
            RoleProbe {
                hit: None,
                failed: Some(url),
            }
        } else {
            RoleProbe::default()
        }
    }
}

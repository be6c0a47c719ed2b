use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::de::IgnoredAny;
use thiserror::Error;
use tracing::debug;

use crate::data::{PackageKind, PackageQuery, UpstreamPayload};

/// Why the snapshot service produced no payload. Either way resolution
/// falls back to the mirrors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum UpstreamError {
    #[error("snapshot service has no record")]
    NotFound,

    #[error("snapshot service unavailable: {0}")]
    Unavailable(String),
}

/// The authoritative snapshot lookup.
pub trait SnapshotService: Send + Sync {
    fn lookup(
        &self,
        query: &PackageQuery,
    ) -> impl Future<Output = Result<UpstreamPayload, UpstreamError>> + Send;
}

impl<T: SnapshotService> SnapshotService for Arc<T> {
    fn lookup(
        &self,
        query: &PackageQuery,
    ) -> impl Future<Output = Result<UpstreamPayload, UpstreamError>> + Send {
        (**self).lookup(query)
    }
}

/// `snapshot.debian.org` machine-readable API client.
#[derive(Debug, Clone)]
pub struct HttpSnapshotService {
    client: reqwest::Client,
    base_url: String,
}

impl HttpSnapshotService {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("debsnap/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;
        Ok(Self::from_client(client, base_url))
    }

    pub fn from_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn endpoint(&self, query: &PackageQuery) -> String {
        let (collection, listing) = match query.kind() {
            PackageKind::Source => ("package", "srcfiles"),
            PackageKind::Binary => ("binary", "binfiles"),
        };
        format!(
            "{}/mr/{collection}/{}/{}/{listing}?fileinfo=1",
            self.base_url,
            query.name(),
            query.version()
        )
    }
}

impl SnapshotService for HttpSnapshotService {
    async fn lookup(&self, query: &PackageQuery) -> Result<UpstreamPayload, UpstreamError> {
        let url = self.endpoint(query);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| UpstreamError::Unavailable(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            debug!(url = %url, "snapshot service has no record");
            return Err(UpstreamError::NotFound);
        }
        if !status.is_success() {
            return Err(UpstreamError::Unavailable(format!("HTTP {}", status.as_u16())));
        }

        let body = response
            .text()
            .await
            .map_err(|e| UpstreamError::Unavailable(e.to_string()))?;
        serde_json::from_str::<IgnoredAny>(&body)
            .map_err(|e| UpstreamError::Unavailable(format!("undecodable payload: {e}")))?;

        Ok(UpstreamPayload {
            status: status.as_u16(),
            body,
        })
    }
}

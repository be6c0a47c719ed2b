use std::sync::Arc;

use bytes::{Bytes, BytesMut};
use futures_util::StreamExt;
use tracing::{debug, warn};

use crate::core::{StatusClass, TokenBucket, classify_status, range_header, retry_delay};
use crate::data::{FetchOptions, FetchOutcome, Fetched};
use crate::effects::governor::{AttemptOutcome, RateGovernor};
use crate::effects::http::HttpClient;
use crate::error::{FetchError, Result};

/// Destination for downloaded bytes.
///
/// A retry either resumes (the sink keeps what it has) or restarts, in which
/// case [`Sink::reset`] is called before any new bytes are written.
pub trait Sink: Send {
    fn write(&mut self, chunk: &[u8]);
    fn reset(&mut self);
}

impl Sink for Vec<u8> {
    fn write(&mut self, chunk: &[u8]) { self.extend_from_slice(chunk); }
    fn reset(&mut self) { self.clear(); }
}

impl Sink for BytesMut {
    fn write(&mut self, chunk: &[u8]) { self.extend_from_slice(chunk); }
    fn reset(&mut self) { self.clear(); }
}

/// Progress carried across attempts of one download.
#[derive(Debug, Default)]
struct TransferState {
    received: u64,
    last_modified: Option<String>,
}

/// Resilient single-URL downloader.
///
/// Share one instance (behind an `Arc`) across the process: the pacing gate
/// and the bandwidth bucket only protect the origin if every download passes
/// through them.
pub struct Downloader<C: HttpClient> {
    client: C,
    options: FetchOptions,
    governor: Arc<RateGovernor>,
    bandwidth: Option<TokenBucket>,
}

impl<C: HttpClient> Downloader<C> {
    pub fn new(client: C, options: FetchOptions) -> Self {
        let governor = Arc::new(RateGovernor::new(options.request_spacing()));
        Self::with_governor(client, options, governor)
    }

    /// Build a downloader that shares an existing pacing gate.
    pub fn with_governor(client: C, options: FetchOptions, governor: Arc<RateGovernor>) -> Self {
        let options = options.normalized();
        let bandwidth = options.max_rate_bytes_per_sec.map(TokenBucket::per_second);
        Self {
            client,
            options,
            governor,
            bandwidth,
        }
    }

    pub fn governor(&self) -> &Arc<RateGovernor> {
        &self.governor
    }

    pub fn options(&self) -> &FetchOptions {
        &self.options
    }

    /// Download `url` into memory.
    pub async fn fetch(&self, url: &str) -> Result<Fetched> {
        let mut buffer = BytesMut::new();
        let outcome = self.fetch_into(url, &mut buffer).await?;
        Ok(Fetched {
            outcome,
            bytes: Bytes::from(buffer),
        })
    }

    /// Download `url`, streaming the body into `sink`.
    ///
    /// Returns [`FetchError::NotFound`] immediately on a 404, and
    /// [`FetchError::RetriesExhausted`] once `max_attempts` retryable failures
    /// have accumulated.
    pub async fn fetch_into<S: Sink>(&self, url: &str, sink: &mut S) -> Result<FetchOutcome> {
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(FetchError::InvalidUrl(url.to_string()));
        }

        let max_attempts = self.options.max_attempts.max(1);
        let mut state = TransferState::default();
        let mut attempt = 0;

        loop {
            attempt += 1;
            let result = self.attempt(url, sink, &mut state).await;

            match result {
                Ok(status) => {
                    self.governor.record_attempt(AttemptOutcome::Success);
                    debug!(url = %url, attempt, bytes = state.received, "download complete");
                    return Ok(FetchOutcome {
                        status,
                        last_modified: state.last_modified,
                        bytes_received: state.received,
                        attempts: attempt,
                    });
                }
                Err(e) => {
                    self.governor.record_attempt(AttemptOutcome::Failed(e.kind()));

                    if !e.is_retryable() {
                        debug!(url = %url, attempt, error = %e, "download failed terminally");
                        return Err(e);
                    }
                    if attempt >= max_attempts {
                        warn!(url = %url, attempts = attempt, error = %e, "giving up on download");
                        return Err(FetchError::RetriesExhausted {
                            attempts: attempt,
                            last: Box::new(e),
                        });
                    }

                    if e.restarts_transfer() && state.received > 0 {
                        sink.reset();
                        state.received = 0;
                    }

                    let delay = retry_delay(
                        attempt - 1,
                        self.options.retry_backoff_duration(),
                        self.options.backoff_factor,
                    );
                    warn!(
                        url = %url,
                        attempt,
                        resume_from = state.received,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "download attempt failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    async fn attempt<S: Sink>(&self, url: &str, sink: &mut S, state: &mut TransferState) -> Result<u16> {
        let _slot = self.governor.wait_for_slot().await;

        let mut headers = self.options.headers.clone();
        if state.received > 0 {
            headers.push(("Range".to_string(), range_header(state.received)));
        }

        let response = match tokio::time::timeout(self.options.connect_timeout(), self.client.get(url, &headers)).await {
            Err(_) => {
                return Err(FetchError::Timeout {
                    stalled_for: self.options.connect_timeout(),
                });
            }
            Ok(Err(e)) => return Err(FetchError::Connect(e.to_string())),
            Ok(Ok(response)) => response,
        };

        match classify_status(response.status) {
            StatusClass::NotFound => {
                return Err(FetchError::NotFound { url: url.to_string() });
            }
            StatusClass::Error => {
                return Err(FetchError::HttpStatus {
                    status: response.status,
                });
            }
            StatusClass::Partial if state.received > 0 => {
                debug!(url = %url, offset = state.received, "resuming transfer");
            }
            StatusClass::Full | StatusClass::Partial => {
                // A full body (or a 206 nobody asked for) starts from zero.
                if state.received > 0 {
                    sink.reset();
                    state.received = 0;
                }
            }
        }

        if response.last_modified.is_some() {
            state.last_modified = response.last_modified;
        }
        let expected = response.content_length.map(|len| state.received + len);
        let stall_window = self.options.stall_window();
        let mut body = response.body;

        loop {
            let chunk = match tokio::time::timeout(stall_window, body.next()).await {
                Err(_) => {
                    return Err(FetchError::Timeout {
                        stalled_for: stall_window,
                    });
                }
                Ok(None) => break,
                Ok(Some(Err(e))) => return Err(FetchError::Body(e.to_string())),
                Ok(Some(Ok(chunk))) => chunk,
            };

            if let Some(bucket) = &self.bandwidth {
                bucket.acquire(chunk.len()).await;
            }
            sink.write(&chunk);
            state.received += chunk.len() as u64;
            self.governor.record_bytes(chunk.len() as u64);
        }

        if let Some(expected) = expected.filter(|expected| state.received < *expected) {
            return Err(FetchError::Partial {
                received: state.received,
                expected,
            });
        }

        Ok(response.status)
    }
}

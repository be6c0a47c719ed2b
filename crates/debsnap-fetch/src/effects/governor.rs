use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::Serialize;
use tokio::time::Instant;

use crate::data::TransferErrorKind;

/// Process-wide request pacing and transfer counters.
///
/// A single governor is shared by every download in the process, so
/// concurrent resolutions still collectively keep at least `spacing` between
/// request starts, and a new request never starts sooner than `spacing` after
/// the most recent completion seen so far.
#[derive(Debug)]
pub struct RateGovernor {
    spacing: Duration,
    // Serializes waiters; held only while a caller sleeps for its turn.
    gate: tokio::sync::Mutex<()>,
    last_mark: Mutex<Option<Instant>>,
    counters: Counters,
}

#[derive(Debug, Default)]
struct Counters {
    attempts: AtomicU64,
    successes: AtomicU64,
    not_found: AtomicU64,
    timeouts: AtomicU64,
    connect_errors: AtomicU64,
    partial_transfers: AtomicU64,
    http_errors: AtomicU64,
    body_errors: AtomicU64,
    bytes: AtomicU64,
}

/// Outcome of one request attempt, as fed to [`RateGovernor::record_attempt`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptOutcome {
    Success,
    Failed(TransferErrorKind),
}

/// Point-in-time copy of the governor counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TransferStats {
    pub attempts: u64,
    pub successes: u64,
    pub not_found: u64,
    pub timeouts: u64,
    pub connect_errors: u64,
    pub partial_transfers: u64,
    pub http_errors: u64,
    pub body_errors: u64,
    pub bytes_transferred: u64,
}

/// Permission to issue one request. Dropping it marks the request complete.
#[must_use = "dropping the slot immediately marks the request complete"]
pub struct Slot<'a> {
    governor: &'a RateGovernor,
}

impl Drop for Slot<'_> {
    fn drop(&mut self) {
        self.governor.mark(Instant::now());
    }
}

impl RateGovernor {
    pub fn new(spacing: Duration) -> Self {
        Self {
            spacing,
            gate: tokio::sync::Mutex::new(()),
            last_mark: Mutex::new(None),
            counters: Counters::default(),
        }
    }

    pub fn spacing(&self) -> Duration {
        self.spacing
    }

    /// Wait until the process may issue its next request.
    pub async fn wait_for_slot(&self) -> Slot<'_> {
        let _turn = self.gate.lock().await;

        // A completion while we sleep pushes the mark forward; wait again.
        while let Some(last) = self.last_mark() {
            let ready_at = last + self.spacing;
            if ready_at <= Instant::now() {
                break;
            }
            tokio::time::sleep_until(ready_at).await;
        }

        self.mark(Instant::now());
        Slot { governor: self }
    }

    pub fn record_attempt(&self, outcome: AttemptOutcome) {
        let c = &self.counters;
        c.attempts.fetch_add(1, Ordering::Relaxed);
        let counter = match outcome {
            AttemptOutcome::Success => &c.successes,
            AttemptOutcome::Failed(TransferErrorKind::NotFound) => &c.not_found,
            AttemptOutcome::Failed(TransferErrorKind::Timeout) => &c.timeouts,
            AttemptOutcome::Failed(TransferErrorKind::Connect) => &c.connect_errors,
            AttemptOutcome::Failed(TransferErrorKind::Partial) => &c.partial_transfers,
            AttemptOutcome::Failed(TransferErrorKind::Http) => &c.http_errors,
            AttemptOutcome::Failed(_) => &c.body_errors,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_bytes(&self, bytes: u64) {
        self.counters.bytes.fetch_add(bytes, Ordering::Relaxed);
    }

    pub fn stats(&self) -> TransferStats {
        let c = &self.counters;
        TransferStats {
            attempts: c.attempts.load(Ordering::Relaxed),
            successes: c.successes.load(Ordering::Relaxed),
            not_found: c.not_found.load(Ordering::Relaxed),
            timeouts: c.timeouts.load(Ordering::Relaxed),
            connect_errors: c.connect_errors.load(Ordering::Relaxed),
            partial_transfers: c.partial_transfers.load(Ordering::Relaxed),
            http_errors: c.http_errors.load(Ordering::Relaxed),
            body_errors: c.body_errors.load(Ordering::Relaxed),
            bytes_transferred: c.bytes.load(Ordering::Relaxed),
        }
    }

    fn last_mark(&self) -> Option<Instant> {
        *self.last_mark.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn mark(&self, at: Instant) {
        let mut last = self.last_mark.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        *last = Some(last.map_or(at, |prev| prev.max(at)));
    }
}

impl Default for RateGovernor {
    fn default() -> Self {
        Self::new(Duration::from_millis(1500))
    }
}

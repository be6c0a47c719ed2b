use std::time::Duration;

use serde::Deserialize;

/// Configuration for mirror downloads.
///
/// Every field has a default, so a partially specified configuration file
/// deserializes cleanly.
///
/// # Examples
///
/// ```
/// use debsnap_fetch::FetchOptions;
/// use std::time::Duration;
///
/// let options = FetchOptions::default()
///     .max_attempts(5)
///     .retry_backoff(Duration::from_secs(1))
///     .header("User-Agent", "debsnap/0.1");
/// assert_eq!(options.max_attempts, 5);
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FetchOptions {
    /// Total attempts per download, including the first one.
    ///
    /// Default: 10
    pub max_attempts: u32,

    /// Delay before the first retry, in milliseconds.
    ///
    /// Default: 4000
    pub retry_backoff_ms: u64,

    /// Growth factor between consecutive retry delays.
    ///
    /// The delay before retry N (0-indexed) is `retry_backoff * factor^N`,
    /// giving 4 s, 16 s, 64 s, 256 s with the defaults.
    ///
    /// Default: 4
    pub backoff_factor: u32,

    /// Time allowed to obtain response headers.
    ///
    /// Default: 30
    pub connect_timeout_secs: u64,

    /// Longest tolerated gap between two body chunks.
    ///
    /// Default: 600
    pub stall_timeout_secs: u64,

    /// Sustained download ceiling in bytes per second. `None` disables throttling.
    ///
    /// Default: 1 MiB/s
    pub max_rate_bytes_per_sec: Option<u64>,

    /// Minimum gap between consecutive requests to the mirror, process-wide.
    ///
    /// Default: 1500
    pub min_request_spacing_ms: u64,

    /// Headers sent with every request, including retries.
    pub headers: Vec<(String, String)>,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            retry_backoff_ms: 4_000,
            backoff_factor: 4,
            connect_timeout_secs: 30,
            stall_timeout_secs: 600,
            max_rate_bytes_per_sec: Some(1024 * 1024),
            min_request_spacing_ms: 1_500,
            headers: Vec::new(),
        }
    }
}

impl FetchOptions {
    pub fn retry_backoff_duration(&self) -> Duration { Duration::from_millis(self.retry_backoff_ms) }

    pub fn connect_timeout(&self) -> Duration { Duration::from_secs(self.connect_timeout_secs) }

    pub fn stall_window(&self) -> Duration { Duration::from_secs(self.stall_timeout_secs) }

    pub fn request_spacing(&self) -> Duration { Duration::from_millis(self.min_request_spacing_ms) }

    #[must_use]
    pub fn max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    #[must_use]
    pub fn retry_backoff(mut self, base: Duration) -> Self {
        self.retry_backoff_ms = base.as_millis() as u64;
        self
    }

    #[must_use]
    pub fn backoff_factor(mut self, factor: u32) -> Self {
        self.backoff_factor = factor;
        self
    }

    #[must_use]
    pub fn stall_timeout(mut self, window: Duration) -> Self {
        self.stall_timeout_secs = window.as_secs();
        self
    }

    #[must_use]
    pub fn max_rate(mut self, bytes_per_sec: Option<u64>) -> Self {
        self.max_rate_bytes_per_sec = bytes_per_sec.filter(|rate| *rate > 0);
        self
    }

    #[must_use]
    pub fn min_request_spacing(mut self, spacing: Duration) -> Self {
        self.min_request_spacing_ms = spacing.as_millis() as u64;
        self
    }

    /// Clamp values that would disable a download outright.
    ///
    /// A zero rate means unthrottled, zero attempts means one, and a zero
    /// connect or stall timeout falls back to its default.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        let defaults = Self::default();
        self.max_rate_bytes_per_sec = self.max_rate_bytes_per_sec.filter(|rate| *rate > 0);
        self.max_attempts = self.max_attempts.max(1);
        if self.stall_timeout_secs == 0 {
            self.stall_timeout_secs = defaults.stall_timeout_secs;
        }
        if self.connect_timeout_secs == 0 {
            self.connect_timeout_secs = defaults.connect_timeout_secs;
        }
        self
    }

    /// Add a single custom HTTP header.
    #[must_use]
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((key.into(), value.into()));
        self
    }
}

use std::time::Duration;

/// Calculate the delay before a retry attempt using exponential backoff.
///
/// The delay formula is: `base * factor^retry_count`
///
/// # Arguments
///
/// * `retry_count` - The current retry number (0-indexed: 0 = first retry)
/// * `base` - The base delay duration
/// * `factor` - Growth factor between consecutive delays
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use debsnap_fetch::retry_delay;
///
/// let base = Duration::from_secs(4);
/// assert_eq!(retry_delay(0, base, 4), Duration::from_secs(4));
/// assert_eq!(retry_delay(1, base, 4), Duration::from_secs(16));
/// assert_eq!(retry_delay(2, base, 4), Duration::from_secs(64));
/// ```
pub fn retry_delay(retry_count: u32, base: Duration, factor: u32) -> Duration {
    // Use saturating_pow to prevent overflow
    let multiplier = factor.max(1).saturating_pow(retry_count);

    // Use saturating_mul to prevent Duration overflow
    base.saturating_mul(multiplier)
}

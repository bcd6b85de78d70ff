use super::{classify_status, FetchError, Fetcher};
use crate::config::ResolverConfig;
use crate::shutdown::Shutdown;
use rand::Rng;
use std::time::Duration;
use url::Url;

/// How often and how patiently a fetch is retried
///
/// The delay before retry `n` (1-based) is:
///
/// ```text
/// delay = min(initial_backoff * 2^(n-1), max_backoff) + random(0..=jitter)
/// ```
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
    pub jitter: Duration,
    /// Applied to every individual attempt
    pub request_timeout: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &ResolverConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            initial_backoff: Duration::from_millis(config.initial_backoff_ms),
            max_backoff: Duration::from_millis(config.max_backoff_ms),
            jitter: Duration::from_millis(config.jitter_ms),
            request_timeout: Duration::from_millis(config.request_timeout_ms),
        }
    }

    /// A single attempt with no waiting
    pub fn no_retry(request_timeout: Duration) -> Self {
        Self {
            max_attempts: 1,
            initial_backoff: Duration::ZERO,
            max_backoff: Duration::ZERO,
            jitter: Duration::ZERO,
            request_timeout,
        }
    }

    /// Exponential part of the delay before retry `attempt`, without jitter
    pub fn base_backoff(&self, attempt: u32) -> Duration {
        let factor = 1u32
            .checked_shl(attempt.saturating_sub(1))
            .unwrap_or(u32::MAX);
        self.initial_backoff
            .saturating_mul(factor)
            .min(self.max_backoff)
    }

    /// Full delay before retry `attempt`, jitter included
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        let jitter_ms = self.jitter.as_millis() as u64;
        let jitter = if jitter_ms == 0 {
            Duration::ZERO
        } else {
            Duration::from_millis(rand::rng().random_range(0..=jitter_ms))
        };
        self.base_backoff(attempt) + jitter
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&ResolverConfig::default())
    }
}

/// Fetches `url`, retrying transient failures according to `policy`
///
/// Each attempt is bounded by the policy's request timeout; a timeout counts
/// as a transient failure. Fatal failures return at once. Both the request
/// and the backoff sleep are abandoned as soon as `shutdown` fires.
///
/// # Returns
///
/// * `Ok(Vec<u8>)` - The body of a 2xx response
/// * `Err(FetchError::Fatal)` - A non-retryable failure
/// * `Err(FetchError::Transient)` - Still failing after `max_attempts`
/// * `Err(FetchError::Cancelled)` - The shutdown signal fired
pub async fn fetch_with_retry(
    fetcher: &dyn Fetcher,
    url: &Url,
    policy: &RetryPolicy,
    shutdown: &Shutdown,
) -> Result<Vec<u8>, FetchError> {
    let cancelled = || FetchError::Cancelled {
        url: url.to_string(),
    };
    let mut attempt = 0u32;

    loop {
        if shutdown.is_triggered() {
            return Err(cancelled());
        }
        attempt += 1;

        let outcome = tokio::select! {
            biased;
            _ = shutdown.triggered() => return Err(cancelled()),
            result = tokio::time::timeout(
                policy.request_timeout,
                fetcher.fetch(url, policy.request_timeout),
            ) => result.unwrap_or_else(|_| {
                Err(FetchError::Transient {
                    url: url.to_string(),
                    reason: "request timed out".to_string(),
                })
            }),
        };

        let error = match outcome.and_then(|response| classify_status(url, response)) {
            Ok(body) => return Ok(body),
            Err(error) => error,
        };

        if !error.is_transient() {
            return Err(error);
        }

        if attempt >= policy.max_attempts {
            let reason = match error {
                FetchError::Transient { reason, .. } => reason,
                other => other.to_string(),
            };
            return Err(FetchError::Transient {
                url: url.to_string(),
                reason: format!("{} (gave up after {} attempts)", reason, attempt),
            });
        }

        let delay = policy.backoff_for(attempt);
        tracing::warn!(
            url = %url,
            attempt,
            delay_ms = delay.as_millis() as u64,
            error = %error,
            "fetch failed; backing off"
        );

        tokio::select! {
            biased;
            _ = shutdown.triggered() => return Err(cancelled()),
            _ = tokio::time::sleep(delay) => {}
        }
    }
}

//! Bounded fixed-delay retry.
//!
//! Applied at the persona-selection, sub-topic-planning and report-generation
//! call sites. Report generation runs with [`RetryPolicy::single`].

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use tracing::warn;

/// Default attempts per call site.
const DEFAULT_MAX_ATTEMPTS: u32 = 3;
/// Default delay between attempts.
const DEFAULT_DELAY_SECS: u64 = 2;

/// Maximum attempts and the fixed delay between them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first. At least 1.
    pub max_attempts: u32,
    /// Delay before each retry.
    pub delay: Duration,
}

impl RetryPolicy {
    /// Creates a policy.
    #[must_use]
    pub const fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            delay,
        }
    }

    /// A policy that never retries.
    #[must_use]
    pub const fn single() -> Self {
        Self {
            max_attempts: 1,
            delay: Duration::ZERO,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS, Duration::from_secs(DEFAULT_DELAY_SECS))
    }
}

/// Runs `operation` until it succeeds or the policy's attempts are spent.
///
/// Every failure is retried; the last error is returned once attempts run out.
///
/// # Errors
///
/// Returns the error of the final attempt.
pub async fn with_retry<F, Fut, T, E>(policy: RetryPolicy, label: &str, operation: F) -> Result<T, E>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let attempts = policy.max_attempts.max(1);
    let mut attempt = 1;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt >= attempts => return Err(e),
            Err(e) => {
                warn!(
                    call = label,
                    attempt,
                    max = attempts,
                    delay_ms = u64::try_from(policy.delay.as_millis()).unwrap_or(u64::MAX),
                    error = %e,
                    "retrying after failure"
                );
                tokio::time::sleep(policy.delay).await;
                attempt += 1;
            }
        }
    }
}

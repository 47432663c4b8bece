//! Exponential backoff with jitter.

use std::time::Duration;
use rand::Rng;

use crate::resilience::retries::RetryPolicy;

/// Delay to wait after failed attempt number `attempt` (1-based).
///
/// `base * 2^(attempt-1)`, capped at the policy maximum, plus up to 10% jitter.
pub fn backoff_delay(policy: &RetryPolicy, attempt: u32) -> Duration {
    if attempt == 0 {
        return Duration::ZERO;
    }

    let factor = 2u64.saturating_pow(attempt - 1);
    let capped = policy
        .base_delay_ms
        .saturating_mul(factor)
        .min(policy.max_delay_ms);

    let jitter = match capped / 10 {
        0 => 0,
        range => rand::thread_rng().gen_range(0..range),
    };

    Duration::from_millis(capped + jitter)
}

//! Global outbound rate limiter.
//!
//! Generalized from the workspace's keyed `RateLimiter` — that one hands a
//! separate bucket to every `user_id:project_id` pair, because it throttles
//! inbound API traffic per tenant. An injector has exactly one outbound
//! pace to keep under a target's WAF/rate-limit radar, shared across every
//! worker, so this is the same `governor` token bucket with the keying
//! stripped out.

use governor::clock::DefaultClock;
use governor::{Quota, RateLimiter as GovernorRateLimiter};
use nonzero_ext::nonzero;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

type DirectLimiter = GovernorRateLimiter<
    governor::state::NotKeyed,
    governor::state::InMemoryState,
    DefaultClock,
>;

/// Paces outbound requests to a single shared rate, shared across every
/// clone (an `Arc` internally).
#[derive(Clone)]
pub struct RateLimiter {
    inner: Arc<DirectLimiter>,
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter").finish_non_exhaustive()
    }
}

impl RateLimiter {
    /// Builds a limiter allowing `requests_per_period` requests per `period`,
    /// with burst capacity equal to that same count.
    ///
    /// # Panics
    ///
    /// Panics if `requests_per_period` is zero or `period` cannot form a
    /// valid quota — both are programmer errors, not runtime conditions.
    /// The configured rate must always be strictly positive.
    #[must_use]
    pub fn new(requests_per_period: u32, period: Duration) -> Self {
        let burst =
            NonZeroU32::new(requests_per_period).unwrap_or(nonzero!(1u32));
        let quota = Quota::with_period(period)
            .expect("rate limit period must be nonzero")
            .allow_burst(burst);
        Self {
            inner: Arc::new(GovernorRateLimiter::direct(quota)),
        }
    }

    /// Blocks the calling task until a slot under the shared rate is
    /// available, then consumes it.
    ///
    /// Uses `governor`'s async `until_ready`, which sleeps without holding
    /// any lock — the whole point of moving from the keyed `Mutex<HashMap>`
    /// approach to `governor`'s own state store is that a slow permit wait
    /// never blocks a sibling worker checking its own permit.
    pub async fn acquire(&self) {
        self.inner.until_ready().await;
    }

    /// Non-blocking check: `true` if a slot is available right now and was
    /// just consumed, `false` if the caller should back off.
    #[must_use]
    pub fn try_acquire(&self) -> bool {
        self.inner.check().is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn allows_burst_then_throttles() {
        let limiter = RateLimiter::new(3, Duration::from_secs(1));
        assert!(limiter.try_acquire());
        assert!(limiter.try_acquire());
        assert!(limiter.try_acquire());
        assert!(!limiter.try_acquire());
    }

    #[tokio::test]
    async fn recovers_after_period() {
        let limiter = RateLimiter::new(1, Duration::from_millis(50));
        assert!(limiter.try_acquire());
        assert!(!limiter.try_acquire());
        tokio::time::sleep(Duration::from_millis(80)).await;
        assert!(limiter.try_acquire());
    }

    #[tokio::test]
    async fn acquire_is_shared_across_clones() {
        let limiter = RateLimiter::new(1, Duration::from_secs(60));
        let other = limiter.clone();
        assert!(limiter.try_acquire());
        assert!(!other.try_acquire());
    }
}

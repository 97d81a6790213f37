//! Per-proxy retry budget and backoff

use std::time::Duration;

/// How many times one proxy is tried, and how long to wait in between
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    budget: u32,
    base_backoff: Duration,
    max_backoff: Duration,
}

impl RetryPolicy {
    pub const DEFAULT_BUDGET: u32 = 3;
    pub const DEFAULT_BASE_BACKOFF: Duration = Duration::from_millis(100);
    pub const DEFAULT_MAX_BACKOFF: Duration = Duration::from_secs(2);

    /// `budget` is clamped to at least one attempt and `max_backoff` to at least `base_backoff`
    pub fn new(budget: u32, base_backoff: Duration, max_backoff: Duration) -> Self {
        Self {
            budget: budget.max(1),
            base_backoff,
            max_backoff: max_backoff.max(base_backoff),
        }
    }

    /// Attempts allowed on a single proxy before it is marked unhealthy
    pub fn budget(&self) -> u32 {
        self.budget
    }

    pub fn base_backoff(&self) -> Duration {
        self.base_backoff
    }

    pub fn max_backoff(&self) -> Duration {
        self.max_backoff
    }

    /// Delay after the `attempt`-th failure (1-based): `attempt * base`, capped
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.base_backoff
            .saturating_mul(attempt.max(1))
            .min(self.max_backoff)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(
            Self::DEFAULT_BUDGET,
            Self::DEFAULT_BASE_BACKOFF,
            Self::DEFAULT_MAX_BACKOFF,
        )
    }
}

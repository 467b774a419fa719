//! Rate limit policy and window types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Fixed window throttling policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitPolicy {
    /// Requests permitted per window
    pub limit: u32,
    /// Window length in seconds
    pub window_secs: u64,
}

impl RateLimitPolicy {
    pub fn new(limit: u32, window_secs: u64) -> Self {
        Self { limit, window_secs }
    }

    /// Public configuration endpoint default: 60 requests per minute
    pub fn public_default() -> Self {
        Self::new(60, 60)
    }

    /// Admin login default: 5 attempts per five minutes
    pub fn admin_login_default() -> Self {
        Self::new(5, 300)
    }
}

/// Counter state of one client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitWindow {
    pub window_start: DateTime<Utc>,
    pub count: u32,
}

impl RateLimitWindow {
    pub fn start(now: DateTime<Utc>) -> Self {
        Self {
            window_start: now,
            count: 0,
        }
    }

    /// Count one request against the policy
    ///
    /// The window resets once more than `window_secs` have elapsed since it
    /// started. A request is allowed iff the count is below the limit, and
    /// only allowed requests are counted.
    pub fn hit(&mut self, policy: &RateLimitPolicy, now: DateTime<Utc>) -> RateLimitResult {
        if self.elapsed_secs(now) > policy.window_secs as i64 {
            *self = Self::start(now);
        }

        let allowed = self.count < policy.limit;
        if allowed {
            self.count += 1;
        }

        RateLimitResult {
            allowed,
            limit: policy.limit,
            remaining: policy.limit.saturating_sub(self.count),
            reset_in_seconds: self.reset_in_seconds(policy, now),
        }
    }

    /// Whether the window has been idle long enough to forget
    pub fn is_stale(&self, window_secs: u64, now: DateTime<Utc>) -> bool {
        self.elapsed_secs(now) > (window_secs as i64).saturating_mul(2)
    }

    fn elapsed_secs(&self, now: DateTime<Utc>) -> i64 {
        (now - self.window_start).num_seconds()
    }

    fn reset_in_seconds(&self, policy: &RateLimitPolicy, now: DateTime<Utc>) -> u64 {
        let remaining = policy.window_secs as i64 - self.elapsed_secs(now);
        remaining.max(0) as u64
    }
}

/// Result of a rate limit check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitResult {
    /// Whether the request is allowed
    pub allowed: bool,
    /// Total limit for the window
    pub limit: u32,
    /// Remaining requests in the current window
    pub remaining: u32,
    /// Time until the window resets (in seconds)
    pub reset_in_seconds: u64,
}

impl RateLimitResult {
    /// Result used when the limiter cannot reach its storage
    pub fn fail_open(policy: &RateLimitPolicy) -> Self {
        Self {
            allowed: true,
            limit: policy.limit,
            remaining: policy.limit,
            reset_in_seconds: policy.window_secs,
        }
    }
}

//! Rate limiting module for preventing abuse
//!
//! Implements sliding window rate limiting using in-memory storage (DashMap).
//! This is suitable for single-instance deployments; each instance keeps
//! its own counters.
//!
//! # Example Usage
//!
//! ```rust,ignore
//! use timeslot::rate_limit::{rate_limit_key, RateLimitPolicy, RateLimiter};
//!
//! let limiter = RateLimiter::new();
//! let key = rate_limit_key(Some(42), "192.168.1.1");
//! if let Err(e) = limiter.check(&RateLimitPolicy::default(), &key) {
//!     // answer 429 with Retry-After: e.retry_after_seconds
//! }
//! ```

use dashmap::DashMap;
use std::time::{Duration, Instant};

/// How often idle keys are swept.
pub const CLEANUP_INTERVAL: Duration = Duration::from_secs(300);

/// Limit applied to every request, configured at startup.
#[derive(Debug, Clone, Copy)]
pub struct RateLimitPolicy {
    pub max_requests: usize,
    pub window: Duration,
}

impl Default for RateLimitPolicy {
    fn default() -> Self {
        Self {
            max_requests: 10000,
            window: Duration::from_secs(3600), // 1 hour
        }
    }
}

/// Key a request is counted under: the bound account when there is one,
/// the client address otherwise.
pub fn rate_limit_key(account_id: Option<i64>, client_ip: &str) -> String {
    match account_id {
        Some(id) => format!("account:{}", id),
        None => format!("ip:{}", client_ip),
    }
}

/// Rate limiter using in-memory storage
pub struct RateLimiter {
    /// Map of requester key -> Request timestamps
    requests: DashMap<String, Vec<Instant>>,
}

/// Error returned when rate limit is exceeded
#[derive(Debug, Clone)]
pub struct RateLimitError {
    /// Number of seconds until the rate limit resets
    pub retry_after_seconds: u64,
}

impl RateLimiter {
    /// Create a new rate limiter
    pub fn new() -> Self {
        Self {
            requests: DashMap::new(),
        }
    }

    /// Check if a request should be rate limited, and record it if not
    ///
    /// `key` identifies the requester (see [`rate_limit_key`]).
    pub fn check(&self, policy: &RateLimitPolicy, key: &str) -> Result<(), RateLimitError> {
        let now = Instant::now();
        let window = policy.window;

        let mut entry = self.requests.entry(key.to_owned()).or_default();

        // Remove requests outside the time window (sliding window)
        entry.retain(|&timestamp| now.duration_since(timestamp) < window);

        if entry.len() >= policy.max_requests {
            // Calculate how long until the oldest request expires
            let retry_after = match entry.first() {
                Some(oldest) => window.saturating_sub(now.duration_since(*oldest)),
                None => window,
            };

            return Err(RateLimitError {
                retry_after_seconds: retry_after.as_secs() + 1, // Round up
            });
        }

        entry.push(now);

        Ok(())
    }

    /// Drop timestamps older than `window` and keys left with none.
    ///
    /// Called periodically (every [`CLEANUP_INTERVAL`]) so idle requesters
    /// do not accumulate.
    pub fn cleanup_old_entries(&self, window: Duration) {
        let now = Instant::now();
        self.requests.retain(|_, timestamps| {
            timestamps.retain(|&t| now.duration_since(t) < window);
            !timestamps.is_empty()
        });
    }

    /// Get the number of tracked keys (for monitoring/debugging)
    pub fn tracked_keys_count(&self) -> usize {
        self.requests.len()
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(max_requests: usize, window: Duration) -> RateLimitPolicy {
        RateLimitPolicy {
            max_requests,
            window,
        }
    }

    #[test]
    fn test_rate_limit_allows_within_limit() {
        let limiter = RateLimiter::new();
        let policy = policy(5, Duration::from_secs(60));

        for _ in 0..5 {
            assert!(limiter.check(&policy, "user1").is_ok());
        }
        assert!(limiter.check(&policy, "user1").is_err());
    }

    #[test]
    fn test_rate_limit_blocks_over_limit() {
        let limiter = RateLimiter::new();
        let policy = policy(3, Duration::from_secs(60));

        for _ in 0..3 {
            limiter.check(&policy, "user1").unwrap();
        }

        let result = limiter.check(&policy, "user1");
        assert!(result.is_err());
        let retry = result.unwrap_err().retry_after_seconds;
        assert!(retry > 0 && retry <= 61);
    }

    #[test]
    fn test_identifiers_are_independent() {
        let limiter = RateLimiter::new();
        let policy = policy(1, Duration::from_secs(60));

        assert!(limiter.check(&policy, "ip:1.1.1.1").is_ok());
        assert!(limiter.check(&policy, "ip:1.1.1.1").is_err());
        assert!(limiter.check(&policy, "ip:2.2.2.2").is_ok());
        assert!(limiter.check(&policy, "account:1").is_ok());
    }

    #[test]
    fn test_sliding_window_expires() {
        let limiter = RateLimiter::new();
        let policy = policy(1, Duration::from_millis(50));

        limiter.check(&policy, "user").unwrap();
        assert!(limiter.check(&policy, "user").is_err());

        std::thread::sleep(Duration::from_millis(80));
        assert!(limiter.check(&policy, "user").is_ok());
    }

    #[test]
    fn test_cleanup_drops_idle_keys() {
        let limiter = RateLimiter::new();
        let window = Duration::from_millis(20);
        let policy = policy(10, window);

        limiter.check(&policy, "a").unwrap();
        limiter.check(&policy, "b").unwrap();
        assert_eq!(limiter.tracked_keys_count(), 2);

        std::thread::sleep(Duration::from_millis(40));
        limiter.cleanup_old_entries(window);
        assert_eq!(limiter.tracked_keys_count(), 0);
    }

    #[test]
    fn test_rate_limit_key_prefers_account() {
        assert_eq!(rate_limit_key(Some(7), "10.0.0.1"), "account:7");
        assert_eq!(rate_limit_key(None, "10.0.0.1"), "ip:10.0.0.1");
    }
}

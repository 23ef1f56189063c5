/// Rate limiting for abuse-prone endpoints
///
/// Sliding-window limiter over in-memory storage (DashMap), suitable for a
/// single-instance deployment. Limits come from the application config.
use dashmap::DashMap;
use once_cell::sync::Lazy;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Global rate limiter instance
pub static RATE_LIMITER: Lazy<Arc<RateLimiter>> = Lazy::new(|| Arc::new(RateLimiter::new()));

/// Sliding window rate limiter
pub struct RateLimiter {
    /// Map of (action:identifier) -> request timestamps
    requests: DashMap<String, Vec<Instant>>,
}

/// Rate limit exceeded error
#[derive(Debug)]
pub struct RateLimitError {
    pub retry_after_seconds: u64,
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

impl RateLimiter {
    pub fn new() -> Self {
        Self {
            requests: DashMap::new(),
        }
    }

    /// Check whether another request is allowed for (action, identifier),
    /// recording it when it is.
    pub fn check_rate_limit(
        &self,
        action: &str,
        identifier: &str,
        max_requests: usize,
        window: Duration,
    ) -> Result<(), RateLimitError> {
        let key = format!("{}:{}", action, identifier);
        let now = Instant::now();

        let mut entry = self.requests.entry(key).or_default();

        // Drop requests outside the sliding window
        entry.retain(|&timestamp| now.duration_since(timestamp) < window);

        if entry.len() >= max_requests {
            let oldest = entry[0];
            let retry_after = window.saturating_sub(now.duration_since(oldest));

            return Err(RateLimitError {
                retry_after_seconds: retry_after.as_secs() + 1, // round up
            });
        }

        entry.push(now);

        Ok(())
    }

    /// Drop identifiers whose entire history has aged out. Called from the
    /// periodic cleanup task.
    pub fn cleanup_old_entries(&self) {
        // Longest window in use is the login window
        let horizon = Duration::from_secs(
            crate::app_config::rate_limit().login_window_seconds.max(3600) as u64,
        );
        let now = Instant::now();
        self.requests
            .retain(|_, stamps| stamps.iter().any(|t| now.duration_since(*t) < horizon));
    }
}

/// Check login attempts per (ip, username) pair.
pub fn check_login_rate_limit(ip: &str, username: &str) -> Result<(), RateLimitError> {
    let conf = crate::app_config::rate_limit();
    RATE_LIMITER.check_rate_limit(
        "login",
        &format!("{}:{}", ip, username),
        conf.login_max_attempts as usize,
        Duration::from_secs(conf.login_window_seconds as u64),
    )
}

/// Check password reset requests per ip.
pub fn check_password_reset_rate_limit(ip: &str) -> Result<(), RateLimitError> {
    // Resets share the login attempt count over a longer window
    let conf = crate::app_config::rate_limit();
    RATE_LIMITER.check_rate_limit(
        "password_reset",
        ip,
        conf.login_max_attempts as usize,
        Duration::from_secs(3600),
    )
}

/// Check search requests per identifier (user id or ip).
pub fn check_search_rate_limit(identifier: &str) -> Result<(), RateLimitError> {
    let conf = crate::app_config::rate_limit();
    RATE_LIMITER.check_rate_limit(
        "search",
        identifier,
        conf.search_max_requests as usize,
        Duration::from_secs(conf.search_window_seconds as u64),
    )
}

/// Entry point for the periodic cleanup task.
pub fn cleanup_old_entries_public() {
    RATE_LIMITER.cleanup_old_entries();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limit_allows_requests_within_limit() {
        let limiter = RateLimiter::new();

        for i in 0..3 {
            assert!(
                limiter
                    .check_rate_limit("test", "user1", 3, Duration::from_secs(10))
                    .is_ok(),
                "Request {} should be allowed",
                i
            );
        }
    }

    #[test]
    fn test_rate_limit_blocks_requests_over_limit() {
        let limiter = RateLimiter::new();

        for _ in 0..3 {
            limiter
                .check_rate_limit("test", "user1", 3, Duration::from_secs(10))
                .unwrap();
        }

        let result = limiter.check_rate_limit("test", "user1", 3, Duration::from_secs(10));
        assert!(result.is_err(), "4th request should be blocked");

        if let Err(err) = result {
            assert!(err.retry_after_seconds > 0, "Should have retry_after time");
        }
    }

    #[test]
    fn test_rate_limit_different_identifiers_independent() {
        let limiter = RateLimiter::new();

        for _ in 0..3 {
            limiter
                .check_rate_limit("test", "user1", 3, Duration::from_secs(10))
                .unwrap();
        }

        assert!(
            limiter
                .check_rate_limit("test", "user2", 3, Duration::from_secs(10))
                .is_ok(),
            "Different identifier should have independent limit"
        );
    }
}

use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

use crate::cache::{Clock, SystemClock, TtlCache};

const MAX_ATTEMPTS: u32 = 5;
const WINDOW: Duration = Duration::from_secs(900); // 15 minutes

/// Failed-login counter per client IP. Each failure restarts the window, so
/// an address stays blocked until it has been quiet for the whole window.
#[derive(Clone)]
pub struct RateLimiter {
    failures: TtlCache<IpAddr, u32>,
    max_attempts: u32,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            failures: TtlCache::with_clock(WINDOW, clock),
            max_attempts: MAX_ATTEMPTS,
        }
    }

    pub fn is_blocked(&self, ip: IpAddr) -> bool {
        self.failures.get(&ip).unwrap_or(0) >= self.max_attempts
    }

    pub fn record_failure(&self, ip: IpAddr) {
        let count = self.failures.get(&ip).unwrap_or(0);
        self.failures.set(ip, count.saturating_add(1), None);
    }

    /// Forget failures for `ip` (call on successful login).
    pub fn clear(&self, ip: IpAddr) {
        self.failures.delete(&ip);
    }

    pub fn spawn_sweeper(&self, interval: Duration) {
        self.failures.spawn_sweeper("login_failures", interval);
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
    use crate::cache::ManualClock;

    fn ip() -> IpAddr {
        "10.0.0.1".parse().unwrap()
    }

    #[test]
    fn blocks_after_max_failures() {
        let limiter = RateLimiter::with_clock(Arc::new(ManualClock::new()));
        for _ in 0..MAX_ATTEMPTS - 1 {
            limiter.record_failure(ip());
        }
        assert!(!limiter.is_blocked(ip()));
        limiter.record_failure(ip());
        assert!(limiter.is_blocked(ip()));
    }

    #[test]
    fn unblocks_after_quiet_window() {
        let clock = ManualClock::new();
        let limiter = RateLimiter::with_clock(Arc::new(clock.clone()));
        for _ in 0..MAX_ATTEMPTS {
            limiter.record_failure(ip());
        }
        assert!(limiter.is_blocked(ip()));
        clock.advance(WINDOW + Duration::from_secs(1));
        assert!(!limiter.is_blocked(ip()));
    }

    #[test]
    fn clear_resets_counter() {
        let limiter = RateLimiter::with_clock(Arc::new(ManualClock::new()));
        for _ in 0..MAX_ATTEMPTS {
            limiter.record_failure(ip());
        }
        limiter.clear(ip());
        assert!(!limiter.is_blocked(ip()));
    }
}

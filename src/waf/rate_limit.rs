//! Per-IP sliding-window rate limiting.
//!
//! A strict sliding window, not a token bucket: bursts are capped exactly at
//! the configured count within any trailing window. State is per-process and
//! keyed by IP; separate OS processes each hold an independent view (a known
//! deployment limitation). Idle IP entries are never evicted.

use std::net::IpAddr;
use std::time::{Duration, Instant};

use dashmap::DashMap;

use crate::config::schema::RateLimitConfig;

/// Sliding-window rate limiter service.
///
/// The DashMap shard lock is held across the prune-check-append sequence for
/// one IP, so concurrent requests from the same address observe a consistent
/// window.
pub struct RateLimiter {
    limit: usize,
    window: Duration,
    windows: DashMap<IpAddr, Vec<Instant>>,
}

impl RateLimiter {
    pub fn new(limit: usize, window: Duration) -> Self {
        Self {
            limit,
            window,
            windows: DashMap::new(),
        }
    }

    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self::new(config.max_requests, Duration::from_secs(config.window_secs))
    }

    /// Record a request from `ip` and decide whether it is allowed.
    ///
    /// Prunes timestamps older than the window, rejects at `count >= limit`
    /// without recording the rejected request, otherwise records and accepts.
    pub fn allow(&self, ip: IpAddr) -> bool {
        self.allow_at(ip, Instant::now())
    }

    /// Clock-injected variant of [`allow`](Self::allow) for deterministic
    /// tests. `now` must not move backwards for a given IP.
    pub fn allow_at(&self, ip: IpAddr, now: Instant) -> bool {
        let mut window = self.windows.entry(ip).or_default();
        window.retain(|&t| now.duration_since(t) < self.window);
        if window.len() >= self.limit {
            false
        } else {
            window.push(now);
            true
        }
    }

    /// Number of IPs currently tracked.
    pub fn tracked_ips(&self) -> usize {
        self.windows.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ip(last: u8) -> IpAddr {
        IpAddr::from([192, 168, 1, last])
    }

    #[test]
    fn test_requests_within_limit_allowed() {
        let limiter = RateLimiter::new(5, Duration::from_secs(60));
        for i in 0..5 {
            assert!(limiter.allow(ip(1)), "request {} should be allowed", i + 1);
        }
    }

    #[test]
    fn test_request_exceeding_limit_blocked() {
        let limiter = RateLimiter::new(20, Duration::from_secs(60));
        for _ in 0..20 {
            assert!(limiter.allow(ip(1)));
        }
        assert!(!limiter.allow(ip(1)), "21st request must be rejected");
    }

    #[test]
    fn test_rejected_requests_not_recorded() {
        let limiter = RateLimiter::new(2, Duration::from_secs(60));
        let base = Instant::now();
        assert!(limiter.allow_at(ip(1), base));
        assert!(limiter.allow_at(ip(1), base));
        // Hammering while blocked must not extend the window.
        for i in 0..5 {
            assert!(!limiter.allow_at(ip(1), base + Duration::from_secs(i)));
        }
        // Both recorded requests age out; the next one is admitted again.
        assert!(limiter.allow_at(ip(1), base + Duration::from_secs(61)));
    }

    #[test]
    fn test_window_slides() {
        let limiter = RateLimiter::new(2, Duration::from_secs(60));
        let base = Instant::now();
        assert!(limiter.allow_at(ip(1), base));
        assert!(limiter.allow_at(ip(1), base + Duration::from_secs(30)));
        assert!(!limiter.allow_at(ip(1), base + Duration::from_secs(59)));
        // The first timestamp leaves the trailing window; one slot frees up.
        assert!(limiter.allow_at(ip(1), base + Duration::from_secs(61)));
        assert!(!limiter.allow_at(ip(1), base + Duration::from_secs(62)));
    }

    #[test]
    fn test_idle_ip_effectively_resets() {
        let limiter = RateLimiter::new(3, Duration::from_secs(60));
        let base = Instant::now();
        for _ in 0..3 {
            assert!(limiter.allow_at(ip(1), base));
        }
        assert!(!limiter.allow_at(ip(1), base + Duration::from_secs(1)));
        let later = base + Duration::from_secs(120);
        for _ in 0..3 {
            assert!(limiter.allow_at(ip(1), later));
        }
    }

    #[test]
    fn test_different_ips_independent() {
        let limiter = RateLimiter::new(1, Duration::from_secs(60));
        assert!(limiter.allow(ip(1)));
        assert!(!limiter.allow(ip(1)));
        assert!(limiter.allow(ip(2)));
        assert_eq!(limiter.tracked_ips(), 2);
    }

    #[test]
    fn test_ipv6_keys() {
        let limiter = RateLimiter::new(1, Duration::from_secs(60));
        let v6: IpAddr = "2001:db8::1".parse().unwrap();
        assert!(limiter.allow(v6));
        assert!(!limiter.allow(v6));
    }
}

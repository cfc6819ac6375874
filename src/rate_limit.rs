use dashmap::{DashMap, mapref::entry::Entry};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, interval_at};
use tracing::debug;

use crate::metrics::RATE_LIMIT_TRACKED;

// Rate limit entry - tracks requests per client in the current window
#[derive(Debug, Clone, Copy)]
pub struct RateLimitEntry {
    pub count: u32,
    pub reset_at: Instant,
}

/// Fixed-window limiter keyed by client identifier.
///
/// The first request past `reset_at` opens a new window with a count of 1,
/// so a client timing requests around the boundary can get close to twice
/// the limit. State lives only in this process.
#[derive(Clone)]
pub struct RateLimiter {
    entries: Arc<DashMap<String, RateLimitEntry>>,
    max_requests: u32, // allowed per window
    window: Duration,
}

impl RateLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
            max_requests,
            window,
        }
    }

    /// Records an attempt and reports whether it goes over the limit.
    pub fn should_block(&self, identifier: &str) -> bool {
        self.should_block_at(identifier, Instant::now())
    }

    pub fn should_block_at(&self, identifier: &str, now: Instant) -> bool {
        let fresh = RateLimitEntry {
            count: 1,
            reset_at: now + self.window,
        };

        // The shard lock is held across read and update
        match self.entries.entry(identifier.to_string()) {
            Entry::Occupied(mut occupied) if now <= occupied.get().reset_at => {
                let entry = occupied.get_mut();
                entry.count = entry.count.saturating_add(1);
                entry.count > self.max_requests
            }
            Entry::Occupied(mut occupied) => {
                occupied.insert(fresh);
                false
            }
            Entry::Vacant(vacant) => {
                vacant.insert(fresh);
                false
            }
        }
    }

    /// Drops every entry whose window has elapsed. Returns how many went.
    pub fn sweep(&self) -> usize {
        self.sweep_at(Instant::now())
    }

    pub fn sweep_at(&self, now: Instant) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| now <= entry.reset_at);
        let remaining = self.entries.len();

        RATE_LIMIT_TRACKED.set(remaining as f64);
        before.saturating_sub(remaining)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    // Background sweep so abandoned identifiers do not pile up
    pub fn spawn_sweeper(&self, every: Duration) -> JoinHandle<()> {
        let limiter = self.clone();

        tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + every, every);
            debug!(interval = ?every, "rate limit sweeper started");

            loop {
                ticker.tick().await;
                let removed = limiter.sweep();
                if removed > 0 {
                    debug!(removed, remaining = limiter.len(), "swept expired rate limit entries");
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOUR: Duration = Duration::from_secs(60 * 60);

    #[test]
    fn sixth_request_in_window_is_blocked() {
        let limiter = RateLimiter::new(5, HOUR);
        let now = Instant::now();

        for attempt in 1..=5 {
            assert!(
                !limiter.should_block_at("203.0.113.7", now),
                "attempt {attempt} should pass"
            );
        }
        assert!(limiter.should_block_at("203.0.113.7", now));
        assert!(limiter.should_block_at("203.0.113.7", now + Duration::from_secs(1)));
    }

    #[test]
    fn identifiers_are_counted_separately() {
        let limiter = RateLimiter::new(1, HOUR);
        let now = Instant::now();

        assert!(!limiter.should_block_at("a", now));
        assert!(limiter.should_block_at("a", now));
        assert!(!limiter.should_block_at("b", now));
        assert_eq!(limiter.len(), 2);
    }

    #[test]
    fn elapsed_window_starts_fresh_count() {
        let limiter = RateLimiter::new(5, HOUR);
        let start = Instant::now();

        for _ in 0..8 {
            limiter.should_block_at("client", start);
        }
        assert!(limiter.should_block_at("client", start + HOUR));

        let later = start + HOUR + Duration::from_secs(1);
        assert!(!limiter.should_block_at("client", later));
        for _ in 0..4 {
            assert!(!limiter.should_block_at("client", later));
        }
        assert!(limiter.should_block_at("client", later));
    }

    #[test]
    fn blocked_attempts_still_count() {
        let limiter = RateLimiter::new(2, HOUR);
        let now = Instant::now();

        limiter.should_block_at("x", now);
        limiter.should_block_at("x", now);
        limiter.should_block_at("x", now);

        assert_eq!(limiter.entries.get("x").map(|e| e.count), Some(3));
    }

    #[test]
    fn sweep_removes_only_expired_entries() {
        let limiter = RateLimiter::new(5, HOUR);
        let start = Instant::now();

        limiter.should_block_at("old", start);
        limiter.should_block_at("new", start + Duration::from_secs(30 * 60));

        assert_eq!(limiter.sweep_at(start + HOUR), 0);
        assert_eq!(limiter.sweep_at(start + HOUR + Duration::from_secs(1)), 1);
        assert_eq!(limiter.len(), 1);
        assert!(limiter.entries.contains_key("new"));
    }

    #[tokio::test(start_paused = true)]
    async fn sweeper_runs_on_interval() {
        let limiter = RateLimiter::new(5, Duration::from_secs(60));
        limiter.should_block("gone-soon");

        let handle = limiter.spawn_sweeper(Duration::from_secs(600));
        tokio::time::sleep(Duration::from_secs(599)).await;
        assert_eq!(limiter.len(), 1);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(limiter.is_empty());
        handle.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn window_follows_runtime_clock() {
        let limiter = RateLimiter::new(1, HOUR);

        assert!(!limiter.should_block("client"));
        assert!(limiter.should_block("client"));

        tokio::time::advance(HOUR + Duration::from_secs(1)).await;
        assert!(!limiter.should_block("client"));
    }

    #[test]
    fn longest_configurable_window_does_not_overflow() {
        let window = Duration::from_secs(crate::config::MAX_RATE_WINDOW_SECS);
        let limiter = RateLimiter::new(5, window);

        assert!(!limiter.should_block("1.2.3.4"));
        assert_eq!(limiter.sweep(), 0);
    }
}

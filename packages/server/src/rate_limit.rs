//! Per-client sliding-window rate limiting.

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

/// Requests allowed per window when not configured.
pub const DEFAULT_MAX_REQUESTS: usize = 10;

/// Window length when not configured.
pub const DEFAULT_WINDOW: Duration = Duration::from_secs(60);

/// Stale clients are swept after this many checks.
const SWEEP_INTERVAL: u64 = 256;

#[derive(Default)]
struct Windows {
    clients: HashMap<String, VecDeque<Instant>>,
    checks: u64,
}

/// Sliding-window request limiter keyed by client identity.
///
/// A client may make at most `max_requests` requests in any `window`.
/// Rejected requests are not recorded.
pub struct RateLimiter {
    max_requests: usize,
    window: Duration,
    windows: Mutex<Windows>,
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_REQUESTS, DEFAULT_WINDOW)
    }
}

impl RateLimiter {
    /// Creates a limiter allowing `max_requests` per `window`.
    #[must_use]
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            windows: Mutex::new(Windows::default()),
        }
    }

    /// Records a request from `client` now, returning `false` if it exceeds
    /// the limit.
    pub fn check(&self, client: &str) -> bool {
        self.check_at(client, Instant::now())
    }

    /// Records a request from `client` at `now`, returning `false` if it
    /// exceeds the limit.
    pub fn check_at(&self, client: &str, now: Instant) -> bool {
        let mut windows = self.windows.lock().unwrap_or_else(PoisonError::into_inner);

        windows.checks = windows.checks.wrapping_add(1);
        if windows.checks % SWEEP_INTERVAL == 0 {
            self.sweep(&mut windows.clients, now);
        }

        let requests = windows.clients.entry(client.to_string()).or_default();
        while requests
            .front()
            .is_some_and(|t| now.saturating_duration_since(*t) >= self.window)
        {
            requests.pop_front();
        }

        if requests.len() >= self.max_requests {
            log::warn!("Rate limit exceeded for {client}");
            return false;
        }

        requests.push_back(now);
        true
    }

    #[cfg(test)]
    fn tracked_clients(&self) -> usize {
        self.windows
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clients
            .len()
    }

    fn sweep(&self, clients: &mut HashMap<String, VecDeque<Instant>>, now: Instant) {
        clients.retain(|_, requests| {
            requests
                .back()
                .is_some_and(|t| now.saturating_duration_since(*t) < self.window)
        });
    }
}

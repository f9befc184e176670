//! Per-user request throttling.
//!
//! At most one accepted request per user per rolling window. Rejected
//! requests are dropped with a user-visible notice, never queued.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use sage_core::UserId;

/// Keyed rolling-window rate limiter.
///
/// Keeps the timestamp of the last accepted request per user; an incoming
/// request is accepted only when the window has elapsed since then. At most
/// one entry per user, cleared only at process exit.
pub struct RateLimiter {
    min_interval: Duration,
    last_accepted: Mutex<HashMap<UserId, Instant>>,
}

impl RateLimiter {
    /// Create a limiter with the given minimum interval between requests.
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_accepted: Mutex::new(HashMap::new()),
        }
    }

    /// Check a request against the rolling window at time `now`.
    ///
    /// On accept, the stored timestamp advances to `now`. On reject, nothing
    /// is mutated.
    pub fn check(&self, user_id: UserId, now: Instant) -> bool {
        let mut map = match self.last_accepted.lock() {
            Ok(m) => m,
            Err(e) => {
                // Fail open: dropping legitimate traffic over a poisoned
                // lock is worse than letting one extra request through.
                tracing::error!(error = %e, "rate limit lock poisoned");
                return true;
            }
        };

        if let Some(last) = map.get(&user_id) {
            if now.duration_since(*last) < self.min_interval {
                return false;
            }
        }
        map.insert(user_id, now);
        true
    }

    /// Check a request arriving now.
    pub fn allow(&self, user_id: UserId) -> bool {
        self.check(user_id, Instant::now())
    }
}

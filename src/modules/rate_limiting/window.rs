//! Per-key sliding window state.

use super::config::Quota;
use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Outcome of asking a window to admit one request.
#[derive(Debug, Clone)]
pub struct WindowDecision {
    /// Whether the request was admitted into the window.
    pub admitted: bool,

    /// Requests currently counted in the window (including this one if admitted).
    pub count: u64,

    /// The configured ceiling.
    pub limit: u64,

    /// Time until the oldest counted entry ages out of the window.
    pub reset_in: Duration,
}

impl WindowDecision {
    /// Retry-After value in whole seconds, never below 1.
    #[inline]
    #[must_use]
    pub fn retry_after_secs(&self) -> u64 {
        let secs = self.reset_in.as_secs_f64().ceil() as u64;
        secs.max(1)
    }
}

/// Request timestamps for one rate-limit key, pruned to the trailing window.
///
/// Not synchronized itself; the owning store shard serializes access.
#[derive(Debug)]
pub(crate) struct WindowState {
    /// Timestamps of admitted requests, oldest first.
    hits: VecDeque<Instant>,

    /// Last time this key was touched, for idle eviction.
    last_seen: Instant,
}

impl WindowState {
    pub(crate) fn new(now: Instant) -> Self {
        Self {
            hits: VecDeque::new(),
            last_seen: now,
        }
    }

    /// Admit one request if the window has room.
    ///
    /// Entries older than the quota window are pruned first, so counts
    /// strictly decrease as requests age out. An admitted request is
    /// recorded exactly once.
    pub(crate) fn try_admit(&mut self, now: Instant, quota: &Quota) -> WindowDecision {
        self.prune(now, quota.window);
        self.last_seen = now;

        let count = self.hits.len() as u64;
        if count < quota.max_requests {
            self.hits.push_back(now);
            WindowDecision {
                admitted: true,
                count: count + 1,
                limit: quota.max_requests,
                reset_in: self.reset_in(now, quota.window),
            }
        } else {
            WindowDecision {
                admitted: false,
                count,
                limit: quota.max_requests,
                reset_in: self.reset_in(now, quota.window),
            }
        }
    }

    /// Current count after pruning, without admitting anything.
    pub(crate) fn count(&mut self, now: Instant, window: Duration) -> u64 {
        self.prune(now, window);
        self.hits.len() as u64
    }

    /// Whether this key has been idle longer than `max_idle`.
    pub(crate) fn is_idle(&self, now: Instant, max_idle: Duration) -> bool {
        now.saturating_duration_since(self.last_seen) > max_idle
    }

    fn prune(&mut self, now: Instant, window: Duration) {
        while let Some(oldest) = self.hits.front() {
            if now.saturating_duration_since(*oldest) >= window {
                self.hits.pop_front();
            } else {
                break;
            }
        }
    }

    fn reset_in(&self, now: Instant, window: Duration) -> Duration {
        self.hits
            .front()
            .map(|oldest| (*oldest + window).saturating_duration_since(now))
            .unwrap_or(Duration::ZERO)
    }
}

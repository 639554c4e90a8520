//! Sharded concurrent store of per-key sliding windows.

use super::config::{Quota, StoreConfig};
use super::window::{WindowDecision, WindowState};
use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;
use std::time::Instant;
use tracing::debug;

/// Concurrent sliding-window counter keyed by rate-limit key.
///
/// Keys are spread over independently locked shards so unrelated clients
/// never contend on the same lock. Per-key mutation happens under a single
/// shard's write lock, which makes each admit linearizable for its key.
pub struct SlidingWindowStore {
    /// Shards, each its own map under its own lock.
    shards: Vec<RwLock<HashMap<String, WindowState>>>,

    /// Store configuration.
    config: StoreConfig,

    /// Stats: total admit checks.
    total_checks: AtomicU64,

    /// Stats: checks that were admitted.
    total_admitted: AtomicU64,

    /// Stats: sweep passes run.
    sweep_cycles: AtomicU64,
}

impl std::fmt::Debug for SlidingWindowStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlidingWindowStore")
            .field("shards", &self.shards.len())
            .field("config", &self.config)
            .finish()
    }
}

impl SlidingWindowStore {
    /// Create a store with the given configuration.
    #[must_use]
    pub fn new(config: StoreConfig) -> Self {
        let shard_count = config.shards.max(1);
        let mut shards = Vec::with_capacity(shard_count);
        for _ in 0..shard_count {
            shards.push(RwLock::new(HashMap::new()));
        }

        Self {
            shards,
            config,
            total_checks: AtomicU64::new(0),
            total_admitted: AtomicU64::new(0),
            sweep_cycles: AtomicU64::new(0),
        }
    }

    /// Create a store with default configuration.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(StoreConfig::default())
    }

    /// Admit one request for `key` against `quota`.
    ///
    /// Creates the window on first sight of the key. The returned decision
    /// carries the in-window count and the time until the oldest entry
    /// expires, for retry guidance.
    pub fn try_admit(&self, key: &str, quota: &Quota) -> WindowDecision {
        self.try_admit_at(key, quota, Instant::now())
    }

    /// Like [`try_admit`](Self::try_admit) with an explicit clock, for tests.
    pub fn try_admit_at(&self, key: &str, quota: &Quota, now: Instant) -> WindowDecision {
        self.total_checks.fetch_add(1, Ordering::Relaxed);

        let shard = &self.shards[self.shard_index(key)];
        let mut map = shard.write().unwrap();
        let state = map
            .entry(key.to_string())
            .or_insert_with(|| WindowState::new(now));
        let decision = state.try_admit(now, quota);

        if decision.admitted {
            self.total_admitted.fetch_add(1, Ordering::Relaxed);
        }

        decision
    }

    /// Current in-window count for `key`, without admitting anything.
    #[must_use]
    pub fn count(&self, key: &str, quota: &Quota) -> u64 {
        let shard = &self.shards[self.shard_index(key)];
        let mut map = shard.write().unwrap();
        match map.get_mut(key) {
            Some(state) => state.count(Instant::now(), quota.window),
            None => 0,
        }
    }

    /// Drop keys that have been idle longer than the configured `max_idle`.
    ///
    /// Suitable for a periodic background task; memory stays bounded by the
    /// number of recently active keys either way, since expired entries are
    /// pruned on every access.
    pub fn sweep(&self) {
        let now = Instant::now();
        let mut dropped = 0usize;

        for shard in &self.shards {
            let mut map = shard.write().unwrap();
            let before = map.len();
            map.retain(|_, state| !state.is_idle(now, self.config.max_idle));
            dropped += before - map.len();
        }

        self.sweep_cycles.fetch_add(1, Ordering::Relaxed);
        if dropped > 0 {
            debug!(dropped, "swept idle rate-limit keys");
        }
    }

    /// Number of keys currently tracked.
    #[must_use]
    pub fn active_keys(&self) -> usize {
        self.shards
            .iter()
            .map(|shard| shard.read().unwrap().len())
            .sum()
    }

    /// Total admit checks performed.
    #[must_use]
    pub fn total_checks(&self) -> u64 {
        self.total_checks.load(Ordering::Relaxed)
    }

    /// Total checks that were admitted.
    #[must_use]
    pub fn total_admitted(&self) -> u64 {
        self.total_admitted.load(Ordering::Relaxed)
    }

    /// Sweep passes run.
    #[must_use]
    pub fn sweep_cycles(&self) -> u64 {
        self.sweep_cycles.load(Ordering::Relaxed)
    }

    fn shard_index(&self, key: &str) -> usize {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        (hasher.finish() as usize) % self.shards.len()
    }
}

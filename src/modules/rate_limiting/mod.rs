//! # Rate Limiting Module
//!
//! Sliding-window request counting for admission control.
//!
//! Each rate-limit key owns a pruned log of request timestamps bounded by
//! the quota window. Keys are partitioned over independently locked shards
//! so concurrent requests for unrelated clients never serialize on a
//! single lock.
//!
//! ## Usage
//!
//! ```ignore
//! use aegis_gateway::modules::rate_limiting::{Quota, SlidingWindowStore};
//! use std::time::Duration;
//!
//! let store = SlidingWindowStore::with_defaults();
//! let quota = Quota::new(5, Duration::from_secs(60));
//!
//! let decision = store.try_admit("guest:1.2.3.4", &quota);
//! if !decision.admitted {
//!     // Deny with Retry-After: decision.retry_after_secs()
//! }
//! ```

mod config;
mod store;
mod window;

pub use config::{Quota, StoreConfig};
pub use store::SlidingWindowStore;
pub use window::WindowDecision;

//! Clock abstractions used by the quota tracker.
//!
//! Providers report reset times as unix epoch seconds, so the tracker works in
//! the same unit. `ManualClock` lets tests drive time explicitly instead of
//! sleeping.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

/// Clock abstraction so quota arithmetic can be faked in tests.
pub trait Clock: Send + Sync + std::fmt::Debug {
    /// Current time as unix epoch seconds.
    fn now_unix(&self) -> u64;
}

/// Wall clock backed by `SystemTime::now()`.
///
/// Notes: provider reset timestamps are wall-clock values, so a monotonic
/// clock is not suitable here. Skew against the provider's clock is absorbed
/// by the re-acquire loop in the retry engine.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_unix(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_secs())
            .unwrap_or(0)
    }
}

/// Manually driven clock for deterministic tests.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<AtomicU64>,
}

impl ManualClock {
    /// Create a clock frozen at the given unix timestamp.
    pub fn new(now: u64) -> Self {
        Self { now: Arc::new(AtomicU64::new(now)) }
    }

    /// Jump to an absolute timestamp.
    pub fn set(&self, now: u64) {
        self.now.store(now, Ordering::SeqCst);
    }

    /// Advance the clock by `secs` seconds.
    pub fn advance(&self, secs: u64) {
        self.now.fetch_add(secs, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_unix(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }
}

//! Quota bookkeeping for rate-limited provider resources.
//!
//! One [`QuotaBucket`] per [`ResourceKey`] tracks how many calls the provider
//! still allows in the current window and when the window resets. The
//! [`QuotaTracker`] owns all buckets behind a single lock; callers only read
//! snapshots or mutate state through `acquire` / `record_*`, which keeps
//! concurrent use safe.
//!
//! Semantics:
//! - Buckets are created lazily and optimistically: until the provider has
//!   reported real quota metadata, calls are allowed through.
//! - Provider data always wins: `record_success` and `record_rate_limited`
//!   overwrite local estimates with the reported values.
//! - `acquire` is atomic per key: when N callers race on `remaining == 1`,
//!   exactly one gets a zero wait and the rest get the time until reset.
//!
//! Invariants:
//! - `remaining <= limit` after every provider update.
//! - No lock is held while a caller sleeps out a returned wait.

use crate::clock::{Clock, SystemClock};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Slack added to computed reset waits to absorb clock skew against the
/// provider. The re-acquire loop is the real safety net; this just avoids a
/// guaranteed extra round through it.
pub const RESET_SLACK: Duration = Duration::from_secs(1);

/// Window assumed when a provider signals quota exhaustion without a reset
/// timestamp.
pub const DEFAULT_RATE_LIMIT_WINDOW: u64 = 60;

/// Identity of one independently rate-limited resource, typically the API
/// route (e.g. `statuses/user_timeline`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceKey(Arc<str>);

impl ResourceKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ResourceKey {
    fn from(route: &str) -> Self {
        Self(Arc::from(route))
    }
}

impl From<String> for ResourceKey {
    fn from(route: String) -> Self {
        Self(Arc::from(route.as_str()))
    }
}

impl fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Quota metadata reported by the provider alongside a response, e.g. parsed
/// from `x-rate-limit-*` headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaSnapshot {
    /// Calls allotted per window.
    pub limit: u32,
    /// Calls left in the current window.
    pub remaining: u32,
    /// Unix timestamp at which the window resets.
    pub reset_at: u64,
}

/// Tracked state for one rate-limited resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaBucket {
    limit: u32,
    remaining: u32,
    reset_at: u64,
}

impl QuotaBucket {
    /// Placeholder state for a key the provider has not reported on yet.
    /// `reset_at == now` means the window is treated as already expired, so
    /// calls pass through until real metadata arrives.
    fn optimistic(now: u64) -> Self {
        Self { limit: 1, remaining: 1, reset_at: now }
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn reset_at(&self) -> u64 {
        self.reset_at
    }
}

impl From<QuotaSnapshot> for QuotaBucket {
    fn from(snapshot: QuotaSnapshot) -> Self {
        Self {
            limit: snapshot.limit,
            remaining: snapshot.remaining.min(snapshot.limit),
            reset_at: snapshot.reset_at,
        }
    }
}

/// Thread-safe store of quota buckets keyed by resource.
///
/// Constructed once and shared (via `Arc`) between the retry engine and the
/// facade; there is no ambient/global instance.
#[derive(Debug)]
pub struct QuotaTracker {
    clock: Arc<dyn Clock>,
    buckets: Mutex<HashMap<ResourceKey, QuotaBucket>>,
}

impl Default for QuotaTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl QuotaTracker {
    /// Tracker on the system wall clock.
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Tracker on a caller-supplied clock (tests use [`crate::ManualClock`]).
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self { clock, buckets: Mutex::new(HashMap::new()) }
    }

    /// Try to reserve one call against `key`.
    ///
    /// Returns `Duration::ZERO` when the call may proceed (the reservation has
    /// been taken), otherwise the time to wait before trying again. Callers
    /// must sleep and re-`acquire` in a loop; a single wait is not guaranteed
    /// to suffice under clock skew or contention.
    pub fn acquire(&self, key: &ResourceKey) -> Duration {
        let now = self.clock.now_unix();
        let mut buckets = self.buckets.lock().unwrap();
        let bucket = buckets.entry(key.clone()).or_insert_with(|| QuotaBucket::optimistic(now));

        if bucket.remaining == 0 {
            if bucket.reset_at > now {
                return Duration::from_secs(bucket.reset_at - now) + RESET_SLACK;
            }
            // Window expired with no fresher provider data; assume the quota
            // came back and let the next response correct us.
            bucket.remaining = bucket.limit.max(1);
        }

        bucket.remaining -= 1;
        Duration::ZERO
    }

    /// Overwrite bucket state with authoritative values from a successful
    /// response. Idempotent; the provider is the source of truth.
    pub fn record_success(&self, key: &ResourceKey, snapshot: QuotaSnapshot) {
        let bucket = QuotaBucket::from(snapshot);
        let mut buckets = self.buckets.lock().unwrap();
        buckets.insert(key.clone(), bucket);
        tracing::debug!(
            key = %key,
            remaining = bucket.remaining,
            reset_at = bucket.reset_at,
            "quota updated from response"
        );
    }

    /// Mark `key` as exhausted until `reset_at`. Falls back to a
    /// [`DEFAULT_RATE_LIMIT_WINDOW`] when the provider gave no reset time.
    pub fn record_rate_limited(&self, key: &ResourceKey, reset_at: Option<u64>) {
        let now = self.clock.now_unix();
        let reset_at = reset_at.unwrap_or(now + DEFAULT_RATE_LIMIT_WINDOW);
        let mut buckets = self.buckets.lock().unwrap();
        let bucket = buckets.entry(key.clone()).or_insert_with(|| QuotaBucket::optimistic(now));
        bucket.remaining = 0;
        bucket.reset_at = reset_at;
        tracing::debug!(key = %key, reset_at, "quota marked exhausted");
    }

    /// Read-only copy of the bucket for `key`, if one exists yet.
    pub fn snapshot(&self, key: &ResourceKey) -> Option<QuotaBucket> {
        self.buckets.lock().unwrap().get(key).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    fn tracker_at(now: u64) -> (QuotaTracker, ManualClock) {
        let clock = ManualClock::new(now);
        (QuotaTracker::with_clock(Arc::new(clock.clone())), clock)
    }

    fn key() -> ResourceKey {
        ResourceKey::from("statuses/user_timeline")
    }

    #[test]
    fn first_acquire_is_optimistic() {
        let (tracker, _clock) = tracker_at(1_000);
        assert_eq!(tracker.acquire(&key()), Duration::ZERO);
    }

    #[test]
    fn acquire_decrements_remaining_as_reservation() {
        let (tracker, _clock) = tracker_at(1_000);
        let key = key();
        tracker.record_success(&key, QuotaSnapshot { limit: 3, remaining: 3, reset_at: 1_900 });

        assert_eq!(tracker.acquire(&key), Duration::ZERO);
        assert_eq!(tracker.snapshot(&key).unwrap().remaining(), 2);
    }

    #[test]
    fn exhausted_bucket_returns_wait_until_reset() {
        let (tracker, _clock) = tracker_at(1_000);
        let key = key();
        tracker.record_success(&key, QuotaSnapshot { limit: 5, remaining: 0, reset_at: 1_300 });

        let wait = tracker.acquire(&key);
        assert_eq!(wait, Duration::from_secs(300) + RESET_SLACK);
        // No reservation was taken.
        assert_eq!(tracker.snapshot(&key).unwrap().remaining(), 0);
    }

    #[test]
    fn expired_window_restores_quota() {
        let (tracker, clock) = tracker_at(1_000);
        let key = key();
        tracker.record_success(&key, QuotaSnapshot { limit: 2, remaining: 0, reset_at: 1_300 });

        clock.set(1_301);
        assert_eq!(tracker.acquire(&key), Duration::ZERO);
        // limit 2, restored then one reserved
        assert_eq!(tracker.snapshot(&key).unwrap().remaining(), 1);
    }

    #[test]
    fn at_most_limit_acquires_succeed_within_window() {
        let (tracker, _clock) = tracker_at(1_000);
        let key = key();
        tracker.record_success(&key, QuotaSnapshot { limit: 4, remaining: 4, reset_at: 2_000 });

        let granted =
            (0..10).filter(|_| tracker.acquire(&key) == Duration::ZERO).count();
        assert_eq!(granted, 4);
    }

    #[test]
    fn concurrent_acquires_grant_exactly_limit() {
        let (tracker, _clock) = tracker_at(1_000);
        let tracker = Arc::new(tracker);
        let key = key();
        tracker.record_success(&key, QuotaSnapshot { limit: 3, remaining: 3, reset_at: 2_000 });

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let tracker = Arc::clone(&tracker);
                let key = key.clone();
                std::thread::spawn(move || tracker.acquire(&key).is_zero())
            })
            .collect();

        let granted = handles.into_iter().map(|h| h.join().unwrap()).filter(|granted| *granted).count();
        assert_eq!(granted, 3);
    }

    #[test]
    fn record_success_overwrites_local_estimates() {
        let (tracker, _clock) = tracker_at(1_000);
        let key = key();
        tracker.record_success(&key, QuotaSnapshot { limit: 10, remaining: 1, reset_at: 1_500 });
        assert_eq!(tracker.acquire(&key), Duration::ZERO);

        // Provider reports a fresher view; it wins over the local decrement.
        let snapshot = QuotaSnapshot { limit: 10, remaining: 7, reset_at: 1_800 };
        tracker.record_success(&key, snapshot);
        tracker.record_success(&key, snapshot); // idempotent

        let bucket = tracker.snapshot(&key).unwrap();
        assert_eq!(bucket.remaining(), 7);
        assert_eq!(bucket.reset_at(), 1_800);
    }

    #[test]
    fn record_success_clamps_remaining_to_limit() {
        let (tracker, _clock) = tracker_at(1_000);
        let key = key();
        tracker.record_success(&key, QuotaSnapshot { limit: 5, remaining: 9, reset_at: 1_500 });
        assert_eq!(tracker.snapshot(&key).unwrap().remaining(), 5);
    }

    #[test]
    fn record_rate_limited_blocks_until_reported_reset() {
        let (tracker, _clock) = tracker_at(1_000);
        let key = key();
        tracker.record_rate_limited(&key, Some(1_120));

        let wait = tracker.acquire(&key);
        assert_eq!(wait, Duration::from_secs(120) + RESET_SLACK);
    }

    #[test]
    fn record_rate_limited_without_reset_uses_default_window() {
        let (tracker, _clock) = tracker_at(1_000);
        let key = key();
        tracker.record_rate_limited(&key, None);

        let wait = tracker.acquire(&key);
        assert_eq!(wait, Duration::from_secs(DEFAULT_RATE_LIMIT_WINDOW) + RESET_SLACK);
    }

    #[test]
    fn buckets_for_different_keys_are_independent() {
        let (tracker, _clock) = tracker_at(1_000);
        let timeline = ResourceKey::from("statuses/user_timeline");
        let friends = ResourceKey::from("friends/ids");
        tracker.record_rate_limited(&timeline, Some(1_900));

        assert!(tracker.acquire(&timeline) > Duration::ZERO);
        assert_eq!(tracker.acquire(&friends), Duration::ZERO);
    }

    #[test]
    fn snapshot_is_none_before_first_access() {
        let (tracker, _clock) = tracker_at(1_000);
        assert!(tracker.snapshot(&key()).is_none());
    }
}

//! Retry engine for a single logical provider request.
//!
//! Semantics:
//! - `max_attempts` bounds provider calls that fail transiently (initial try
//!   plus retries). Rate-limited responses do not consume the budget; they
//!   are absorbed by waiting out the quota window.
//! - Every attempt first reserves quota through the [`QuotaTracker`],
//!   sleeping out any returned wait in a loop (a single wait is not assumed
//!   to suffice).
//! - Fatal failures propagate immediately. Transient failures back off with
//!   jitter before the next attempt.
//! - No lock is held during any sleep; waits go through the injected
//!   [`Sleeper`] so tests never block on real time.
//!
//! Invariants:
//! - Exactly one provider call is made for a fatal failure.
//! - Transient attempts never exceed `max_attempts`.
//! - A rate-limited verdict always records the reset before re-acquiring.

use crate::classify::{classify, FailureKind};
use crate::error::{FetchError, MAX_RECORDED_FAILURES};
use crate::provider::{ProviderError, ProviderResponse};
use crate::quota::{QuotaTracker, ResourceKey};
use crate::sleeper::Sleeper;
use crate::{Backoff, Jitter};
use std::collections::VecDeque;
use std::future::Future;
use std::sync::Arc;

/// Retry configuration: attempt budget, backoff, and jitter.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_attempts: usize,
    backoff: Backoff,
    jitter: Jitter,
}

impl RetryPolicy {
    /// Construct a new builder with defaults.
    pub fn builder() -> RetryPolicyBuilder {
        RetryPolicyBuilder::new()
    }

    pub fn max_attempts(&self) -> usize {
        self.max_attempts
    }

    pub fn backoff(&self) -> &Backoff {
        &self.backoff
    }

    pub fn jitter(&self) -> Jitter {
        self.jitter
    }
}

impl Default for RetryPolicy {
    /// Five attempts, exponential backoff from 1s capped at 60s, full jitter.
    fn default() -> Self {
        Self { max_attempts: 5, backoff: Backoff::default(), jitter: Jitter::Full }
    }
}

/// Errors produced while building a retry policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildError {
    /// `max_attempts` must be > 0.
    InvalidMaxAttempts(usize),
}

impl std::fmt::Display for BuildError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BuildError::InvalidMaxAttempts(n) => {
                write!(f, "max_attempts must be > 0 (got {})", n)
            }
        }
    }
}

impl std::error::Error for BuildError {}

/// Builder for [`RetryPolicy`].
#[derive(Debug, Clone)]
pub struct RetryPolicyBuilder {
    max_attempts: usize,
    backoff: Backoff,
    jitter: Jitter,
}

impl RetryPolicyBuilder {
    pub fn new() -> Self {
        let defaults = RetryPolicy::default();
        Self {
            max_attempts: defaults.max_attempts,
            backoff: defaults.backoff,
            jitter: defaults.jitter,
        }
    }

    /// Total attempts (initial call + retries). Must be > 0.
    pub fn max_attempts(mut self, attempts: usize) -> Self {
        self.max_attempts = attempts;
        self
    }

    /// Backoff strategy for transient failures.
    pub fn backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }

    /// Jitter strategy applied to backoff delays.
    pub fn with_jitter(mut self, jitter: Jitter) -> Self {
        self.jitter = jitter;
        self
    }

    /// Build the retry policy, validating inputs.
    pub fn build(self) -> Result<RetryPolicy, BuildError> {
        if self.max_attempts == 0 {
            return Err(BuildError::InvalidMaxAttempts(0));
        }
        Ok(RetryPolicy {
            max_attempts: self.max_attempts,
            backoff: self.backoff,
            jitter: self.jitter,
        })
    }
}

impl Default for RetryPolicyBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Executes single logical requests, combining quota waits with
/// classification-driven retry.
#[derive(Debug, Clone)]
pub struct RetryEngine {
    policy: RetryPolicy,
    tracker: Arc<QuotaTracker>,
    sleeper: Arc<dyn Sleeper>,
}

impl RetryEngine {
    pub fn new(policy: RetryPolicy, tracker: Arc<QuotaTracker>, sleeper: Arc<dyn Sleeper>) -> Self {
        Self { policy, tracker, sleeper }
    }

    pub fn tracker(&self) -> &Arc<QuotaTracker> {
        &self.tracker
    }

    /// Run `operation` until it succeeds, fails fatally, or exhausts the
    /// transient-retry budget. Quota metadata on success and rate-limit
    /// verdicts on failure both feed back into the tracker.
    pub async fn execute<T, Fut, Op>(
        &self,
        key: &ResourceKey,
        mut operation: Op,
    ) -> Result<T, FetchError>
    where
        T: Send,
        Fut: Future<Output = Result<ProviderResponse<T>, ProviderError>> + Send,
        Op: FnMut() -> Fut + Send,
    {
        let mut attempts = 0usize;
        let mut failures: VecDeque<ProviderError> = VecDeque::new();

        loop {
            self.wait_for_quota(key).await;

            match operation().await {
                Ok(response) => {
                    if let Some(quota) = response.quota {
                        self.tracker.record_success(key, quota);
                    }
                    return Ok(response.payload);
                }
                Err(error) => match classify(&error) {
                    FailureKind::Fatal => {
                        tracing::error!(key = %key, %error, "fatal provider failure");
                        return Err(FetchError::Fatal(error));
                    }
                    FailureKind::RateLimited => {
                        tracing::warn!(key = %key, %error, "provider reported quota exhausted");
                        self.tracker.record_rate_limited(key, error.reset_at());
                        // The next acquire computes the correct wait.
                    }
                    FailureKind::Transient => {
                        attempts += 1;
                        tracing::warn!(key = %key, attempts, %error, "transient provider failure");

                        failures.push_back(error);
                        while failures.len() > MAX_RECORDED_FAILURES {
                            failures.pop_front();
                        }

                        if attempts >= self.policy.max_attempts {
                            return Err(FetchError::retries_exhausted(
                                attempts,
                                failures.into_iter().collect(),
                            ));
                        }

                        let delay =
                            self.policy.jitter.apply(self.policy.backoff.delay(attempts));
                        self.sleeper.sleep(delay).await;
                    }
                },
            }
        }
    }

    /// Reserve quota for `key`, sleeping out reset windows as needed. Loops
    /// because a wait may wake early or another caller may have drained the
    /// restored window first.
    async fn wait_for_quota(&self, key: &ResourceKey) {
        loop {
            let wait = self.tracker.acquire(key);
            if wait.is_zero() {
                return;
            }
            tracing::info!(
                key = %key,
                wait_secs = wait.as_secs(),
                "rate limit reached, waiting for reset"
            );
            self.sleeper.sleep(wait).await;
        }
    }
}

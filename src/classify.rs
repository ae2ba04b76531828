//! Failure classification driving retry policy.
//!
//! The split matters: treating a rate-limit response as transient hammers an
//! already exhausted quota window, and treating a fatal response as transient
//! retries an error that can never succeed. Classification is a pure function
//! of the provider failure so it can be tested in isolation.

use crate::provider::ProviderError;

/// What a provider failure means for the retry loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The request itself is invalid, unauthorized, or the resource is gone.
    /// Propagated immediately, never retried.
    Fatal,
    /// The provider explicitly signalled quota exhaustion. Absorbed by
    /// waiting out the reset window; never surfaced to callers.
    RateLimited,
    /// Network failure, timeout, or server-side malfunction. Retried with
    /// backoff up to the configured budget.
    Transient,
}

/// Map a provider failure to its [`FailureKind`].
///
/// - 429 → `RateLimited` (with or without reset metadata; the tracker falls
///   back to a default window when the reset time is missing)
/// - network errors, timeouts, and 5xx statuses → `Transient`
/// - everything else (other 4xx, auth failures, malformed requests) → `Fatal`
pub fn classify(error: &ProviderError) -> FailureKind {
    match error {
        ProviderError::Network(_) | ProviderError::Timeout { .. } => FailureKind::Transient,
        ProviderError::Status { status, .. } => match *status {
            429 => FailureKind::RateLimited,
            500..=599 => FailureKind::Transient,
            _ => FailureKind::Fatal,
        },
    }
}

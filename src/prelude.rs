//! Convenient re-exports for common quotaguard types.
pub use crate::{
    backoff::{Backoff, BackoffError, MAX_BACKOFF},
    classify::{classify, FailureKind},
    client::{ApiClient, ApiClientBuilder},
    clock::{Clock, ManualClock, SystemClock},
    error::{FetchError, MAX_RECORDED_FAILURES},
    jitter::Jitter,
    provider::{DataProvider, ProviderError, ProviderResponse, Request},
    quota::{QuotaBucket, QuotaSnapshot, QuotaTracker, ResourceKey},
    retry::{BuildError, RetryEngine, RetryPolicy, RetryPolicyBuilder},
    sleeper::{InstantSleeper, Sleeper, TokioSleeper, TrackingSleeper},
};

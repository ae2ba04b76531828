//! Public facade over a quota-limited data provider.
//!
//! [`ApiClient::get_data`] is the single logical operation: it blocks (in the
//! async sense) until the provider's quota allows the call, absorbs transient
//! provider failures, and returns either the payload or one terminal
//! [`FetchError`]. A call may take tens of minutes when the quota window is
//! exhausted; the facade imposes no deadline of its own, so callers needing a
//! bound should wrap it in `tokio::time::timeout` or similar. Cancelling
//! mid-wait is safe: bucket state only changes inside the tracker's atomic
//! operations, never during a sleep.
//!
//! Example
//! ```rust
//! use quotaguard::{
//!     ApiClient, DataProvider, ProviderError, ProviderResponse, Request,
//! };
//!
//! #[derive(Debug)]
//! struct StaticProvider;
//!
//! #[async_trait::async_trait]
//! impl DataProvider for StaticProvider {
//!     type Data = String;
//!     async fn send(
//!         &self,
//!         request: &Request,
//!     ) -> Result<ProviderResponse<String>, ProviderError> {
//!         Ok(ProviderResponse::new(format!("data for {}", request.route())))
//!     }
//! }
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let client = ApiClient::new(StaticProvider);
//! let request = Request::new("statuses/user_timeline").param("count", "200");
//! let data = client.get_data(&request).await.unwrap();
//! assert_eq!(data, "data for statuses/user_timeline");
//! # });
//! ```

use crate::clock::{Clock, SystemClock};
use crate::error::FetchError;
use crate::provider::{DataProvider, Request};
use crate::quota::{QuotaBucket, QuotaTracker, ResourceKey};
use crate::retry::{RetryEngine, RetryPolicy};
use crate::sleeper::{Sleeper, TokioSleeper};
use std::sync::Arc;

/// Rate-limit-aware, fault-tolerant client over a [`DataProvider`].
///
/// Cheap to share: wrap it in an `Arc` and call [`get_data`](Self::get_data)
/// from as many tasks as needed. Quota accounting is serialized per resource
/// key; requests for different keys never contend.
#[derive(Debug)]
pub struct ApiClient<P> {
    provider: Arc<P>,
    tracker: Arc<QuotaTracker>,
    engine: RetryEngine,
}

impl<P> ApiClient<P>
where
    P: DataProvider,
{
    /// Client with default retry policy, wall clock, and tokio sleeps.
    pub fn new(provider: P) -> Self {
        Self::builder(provider).build()
    }

    /// Start configuring a client.
    pub fn builder(provider: P) -> ApiClientBuilder<P> {
        ApiClientBuilder::new(provider)
    }

    /// Fetch the data described by `request`.
    ///
    /// Blocks through quota waits and transient retries. Never surfaces a
    /// rate-limit failure; returns [`FetchError::Fatal`] for unrecoverable
    /// provider responses and [`FetchError::RetriesExhausted`] when the
    /// transient budget runs out.
    pub async fn get_data(&self, request: &Request) -> Result<P::Data, FetchError> {
        let key = request.route().clone();
        let provider = Arc::clone(&self.provider);
        let request = request.clone();
        self.engine
            .execute(&key, move || {
                let provider = Arc::clone(&provider);
                let request = request.clone();
                async move { provider.send(&request).await }
            })
            .await
    }

    /// Read-only view of the tracked quota for `key`, if any provider
    /// response has populated it yet.
    pub fn quota(&self, key: &ResourceKey) -> Option<QuotaBucket> {
        self.tracker.snapshot(key)
    }
}

/// Builder for [`ApiClient`].
#[derive(Debug)]
pub struct ApiClientBuilder<P> {
    provider: P,
    policy: RetryPolicy,
    sleeper: Arc<dyn Sleeper>,
    clock: Arc<dyn Clock>,
}

impl<P> ApiClientBuilder<P>
where
    P: DataProvider,
{
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            policy: RetryPolicy::default(),
            sleeper: Arc::new(TokioSleeper),
            clock: Arc::new(SystemClock),
        }
    }

    /// Replace the default retry policy.
    pub fn retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Provide a custom sleeper implementation (tests use
    /// [`crate::InstantSleeper`] or [`crate::TrackingSleeper`]).
    pub fn with_sleeper<S>(mut self, sleeper: S) -> Self
    where
        S: Sleeper + 'static,
    {
        self.sleeper = Arc::new(sleeper);
        self
    }

    /// Provide a custom clock (tests use [`crate::ManualClock`]).
    pub fn with_clock<C>(mut self, clock: C) -> Self
    where
        C: Clock + 'static,
    {
        self.clock = Arc::new(clock);
        self
    }

    pub fn build(self) -> ApiClient<P> {
        let tracker = Arc::new(QuotaTracker::with_clock(self.clock));
        let engine = RetryEngine::new(self.policy, Arc::clone(&tracker), self.sleeper);
        ApiClient { provider: Arc::new(self.provider), tracker, engine }
    }
}

//! The data-provider seam.
//!
//! The facade does not speak HTTP itself; it drives an opaque
//! [`DataProvider`] that executes one request and hands back either a
//! [`ProviderResponse`] (payload plus any rate-limit metadata the provider
//! attached) or a [`ProviderError`]. The error set is closed on purpose:
//! classification stays centralized in the `classify` module and independent of
//! transport details.

use crate::quota::{QuotaSnapshot, ResourceKey};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Parameters for one logical fetch against the provider.
///
/// The route doubles as the [`ResourceKey`] for quota accounting, matching
/// providers that rate-limit per endpoint.
#[derive(Debug, Clone)]
pub struct Request {
    route: ResourceKey,
    params: Vec<(String, String)>,
}

impl Request {
    pub fn new(route: impl Into<ResourceKey>) -> Self {
        Self { route: route.into(), params: Vec::new() }
    }

    /// Append a query parameter.
    pub fn param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((name.into(), value.into()));
        self
    }

    pub fn route(&self) -> &ResourceKey {
        &self.route
    }

    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }
}

/// Successful provider response.
#[derive(Debug, Clone)]
pub struct ProviderResponse<T> {
    /// Parsed payload.
    pub payload: T,
    /// Rate-limit metadata from the response, when the provider sent any
    /// (e.g. `x-rate-limit-remaining` / `x-rate-limit-reset` headers).
    pub quota: Option<QuotaSnapshot>,
}

impl<T> ProviderResponse<T> {
    pub fn new(payload: T) -> Self {
        Self { payload, quota: None }
    }

    pub fn with_quota(mut self, quota: QuotaSnapshot) -> Self {
        self.quota = Some(quota);
        self
    }
}

/// Failures a provider call can report.
///
/// Closed variant set consumed by the failure classifier; transports map
/// their own error types into these before returning.
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    /// Non-success HTTP status. Rate-limit responses may carry quota
    /// metadata parsed from the error response headers.
    #[error("provider returned status {status}: {message}")]
    Status { status: u16, message: String, quota: Option<QuotaSnapshot> },
    /// Connection-level failure, including empty or truncated responses.
    #[error("network error: {0}")]
    Network(String),
    /// The provider did not answer in time.
    #[error("provider timed out after {elapsed:?}")]
    Timeout { elapsed: Duration },
}

impl ProviderError {
    /// HTTP status, when this failure came from a status response.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Quota metadata attached to the failure, if any.
    pub fn quota(&self) -> Option<&QuotaSnapshot> {
        match self {
            Self::Status { quota, .. } => quota.as_ref(),
            _ => None,
        }
    }

    /// Reset timestamp carried by the failure, if the provider reported one.
    pub fn reset_at(&self) -> Option<u64> {
        self.quota().map(|q| q.reset_at)
    }
}

/// Request-execution primitive supplied by the transport layer.
#[async_trait]
pub trait DataProvider: Send + Sync {
    /// Parsed payload type returned on success.
    type Data: Send;

    /// Execute one request. Implementations perform the actual wire call and
    /// must not retry internally; retry and quota policy live in the facade.
    async fn send(&self, request: &Request)
        -> Result<ProviderResponse<Self::Data>, ProviderError>;
}

#[async_trait]
impl<P: DataProvider + ?Sized> DataProvider for Arc<P> {
    type Data = P::Data;

    async fn send(&self, request: &Request)
        -> Result<ProviderResponse<Self::Data>, ProviderError> {
        (**self).send(request).await
    }
}

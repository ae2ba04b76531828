#![forbid(unsafe_code)]
#![deny(warnings)]
#![cfg_attr(not(test), deny(clippy::all))]

//! # quotaguard
//!
//! A rate-limit-aware, fault-tolerant client facade for quota-limited HTTP
//! data APIs. Callers issue one logical operation, "fetch this data", and get
//! back either the data or a definitive failure; waiting out quota windows,
//! retrying transient provider failures, and quota bookkeeping all happen
//! inside the facade, which never exceeds the provider's published limits.
//!
//! ## Pieces
//!
//! - [`QuotaTracker`]: thread-safe per-resource quota buckets, updated from
//!   provider-reported metadata, atomic reservation via `acquire`.
//! - `classify`: pure mapping of provider failures to fatal / rate-limited
//!   / transient verdicts.
//! - [`RetryEngine`]: drives a single logical request through quota waits,
//!   backoff, and retries.
//! - [`ApiClient`]: the facade composing all of the above over an opaque
//!   [`DataProvider`] supplied by the transport layer.
//!
//! ## Quick start
//!
//! ```rust
//! use quotaguard::{
//!     ApiClient, Backoff, DataProvider, Jitter, ProviderError, ProviderResponse,
//!     Request, RetryPolicy,
//! };
//! use std::time::Duration;
//!
//! #[derive(Debug)]
//! struct MyTransport;
//!
//! #[async_trait::async_trait]
//! impl DataProvider for MyTransport {
//!     type Data = Vec<u8>;
//!     async fn send(
//!         &self,
//!         _request: &Request,
//!     ) -> Result<ProviderResponse<Vec<u8>>, ProviderError> {
//!         // Real transports perform the HTTP call and attach quota headers.
//!         Ok(ProviderResponse::new(b"payload".to_vec()))
//!     }
//! }
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let policy = RetryPolicy::builder()
//!     .max_attempts(5)
//!     .backoff(Backoff::exponential(Duration::from_secs(1)).with_max(Duration::from_secs(60)).unwrap())
//!     .with_jitter(Jitter::full())
//!     .build()
//!     .unwrap();
//!
//! let client = ApiClient::builder(MyTransport).retry_policy(policy).build();
//! let data = client.get_data(&Request::new("statuses/user_timeline")).await.unwrap();
//! assert_eq!(data, b"payload");
//! # });
//! ```

pub mod backoff;
pub mod classify;
pub mod client;
pub mod clock;
pub mod error;
pub mod jitter;
pub mod prelude;
pub mod provider;
pub mod quota;
pub mod retry;
pub mod sleeper;

// Re-exports
pub use backoff::Backoff;
pub use classify::{classify, FailureKind};
pub use client::{ApiClient, ApiClientBuilder};
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::FetchError;
pub use jitter::Jitter;
pub use provider::{DataProvider, ProviderError, ProviderResponse, Request};
pub use quota::{QuotaBucket, QuotaSnapshot, QuotaTracker, ResourceKey};
pub use retry::{RetryEngine, RetryPolicy, RetryPolicyBuilder};
pub use sleeper::{InstantSleeper, Sleeper, TokioSleeper, TrackingSleeper};

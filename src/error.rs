//! Terminal errors surfaced by the facade.
//!
//! `get_data` either returns data or exactly one of these. Rate-limit
//! responses never appear here; they are absorbed by waiting. The two
//! variants stay distinguishable so callers can tell "the provider was
//! broken" from "your request was wrong".

use crate::provider::ProviderError;
use std::fmt;

/// Cap on the failures recorded inside `RetriesExhausted` to avoid unbounded
/// growth with large retry budgets.
pub const MAX_RECORDED_FAILURES: usize = 10;

/// Terminal error returned by [`crate::ApiClient::get_data`].
#[derive(Debug, Clone)]
pub enum FetchError {
    /// The request itself was rejected; retrying cannot help.
    Fatal(ProviderError),
    /// Every attempt failed transiently within the configured retry budget.
    RetriesExhausted {
        /// Total attempts made.
        attempts: usize,
        /// Most recent transient failures, capped at [`MAX_RECORDED_FAILURES`].
        failures: Vec<ProviderError>,
    },
}

impl FetchError {
    /// Construct `RetriesExhausted`, keeping only the most recent failures.
    pub fn retries_exhausted(attempts: usize, mut failures: Vec<ProviderError>) -> Self {
        if failures.len() > MAX_RECORDED_FAILURES {
            failures.drain(..failures.len() - MAX_RECORDED_FAILURES);
        }
        FetchError::RetriesExhausted { attempts, failures }
    }

    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Fatal(_))
    }

    pub fn is_retries_exhausted(&self) -> bool {
        matches!(self, Self::RetriesExhausted { .. })
    }

    /// The provider failure that terminated the call, if one was recorded.
    pub fn last_failure(&self) -> Option<&ProviderError> {
        match self {
            Self::Fatal(error) => Some(error),
            Self::RetriesExhausted { failures, .. } => failures.last(),
        }
    }

    /// Attempt count and number of recorded failures, for `RetriesExhausted`.
    pub fn retries_exhausted_info(&self) -> Option<(usize, usize)> {
        match self {
            Self::RetriesExhausted { attempts, failures } => Some((*attempts, failures.len())),
            _ => None,
        }
    }
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fatal(error) => write!(f, "fatal provider failure: {}", error),
            Self::RetriesExhausted { attempts, failures } => {
                let truncated_note = if failures.len() < *attempts {
                    format!(" (recorded last {} failures)", failures.len())
                } else {
                    String::new()
                };
                if let Some(last) = failures.last() {
                    write!(
                        f,
                        "retries exhausted after {} attempts{}; last error: {}",
                        attempts, truncated_note, last
                    )
                } else {
                    write!(
                        f,
                        "retries exhausted after {} attempts{}; no recorded failures",
                        attempts, truncated_note
                    )
                }
            }
        }
    }
}

impl std::error::Error for FetchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.last_failure().map(|e| e as &dyn std::error::Error)
    }
}

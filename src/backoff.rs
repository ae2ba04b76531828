//! Backoff strategies for spacing out retries of transient failures.
//!
//! Attempt semantics: attempt `0` is the initial call and never delays;
//! retries start at `attempt = 1`. All arithmetic saturates at [`MAX_BACKOFF`]
//! so pathological attempt counts cannot overflow.
//!
//! Backoff spacing is independent of quota waiting: backoff absorbs provider
//! instability, quota waits keep the client inside published rate limits.
//!
//! Example
//! ```rust
//! use std::time::Duration;
//! use quotaguard::Backoff;
//!
//! let backoff = Backoff::exponential(Duration::from_secs(1))
//!     .with_max(Duration::from_secs(60))
//!     .unwrap();
//! assert_eq!(backoff.delay(0), Duration::ZERO); // initial call
//! assert_eq!(backoff.delay(1), Duration::from_secs(1));
//! assert_eq!(backoff.delay(2), Duration::from_secs(2));
//! assert_eq!(backoff.delay(10), Duration::from_secs(60)); // capped
//! ```

use std::fmt;
use std::time::Duration;

/// Ceiling applied when calculations overflow (1 hour).
pub const MAX_BACKOFF: Duration = Duration::from_secs(60 * 60);

/// Errors returned by backoff configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackoffError {
    ConstantDoesNotSupportMax,
    MaxMustBePositive,
    MaxLessThanBase { base: Duration, max: Duration },
}

impl fmt::Display for BackoffError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackoffError::ConstantDoesNotSupportMax => {
                write!(f, "with_max is only valid for exponential backoff")
            }
            BackoffError::MaxMustBePositive => write!(f, "max must be greater than zero"),
            BackoffError::MaxLessThanBase { base, max } => {
                write!(f, "max ({:?}) must be >= base ({:?})", max, base)
            }
        }
    }
}

impl std::error::Error for BackoffError {}

/// Delay strategy applied between transient-failure retries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Backoff {
    /// Same delay before every retry.
    Constant { delay: Duration },
    /// Delay doubles per retry, optionally capped.
    Exponential { base: Duration, max: Option<Duration> },
}

impl Backoff {
    /// Create a constant backoff strategy.
    pub fn constant(delay: Duration) -> Self {
        Backoff::Constant { delay }
    }

    /// Create an exponential backoff strategy (base, 2x per retry, uncapped).
    pub fn exponential(base: Duration) -> Self {
        Backoff::Exponential { base, max: None }
    }

    /// Cap the delay of an exponential backoff.
    /// Errors on `Constant`, on a zero max, or when `max < base`.
    pub fn with_max(self, max: Duration) -> Result<Self, BackoffError> {
        if max.is_zero() {
            return Err(BackoffError::MaxMustBePositive);
        }
        match self {
            Backoff::Exponential { base, .. } => {
                if max < base {
                    return Err(BackoffError::MaxLessThanBase { base, max });
                }
                Ok(Backoff::Exponential { base, max: Some(max) })
            }
            Backoff::Constant { .. } => Err(BackoffError::ConstantDoesNotSupportMax),
        }
    }

    /// Delay for a given attempt (0-based; 0 = initial call, no delay).
    pub fn delay(&self, attempt: usize) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }
        match self {
            Backoff::Constant { delay } => (*delay).min(MAX_BACKOFF),
            Backoff::Exponential { base, max } => {
                let exponent = attempt.saturating_sub(1).min(u32::MAX as usize) as u32;
                let multiplier = 2u128.saturating_pow(exponent);
                let nanos = base.as_nanos().saturating_mul(multiplier);
                let exp_delay = Duration::from_nanos(nanos.min(MAX_BACKOFF.as_nanos()) as u64);
                let capped = max.map(|m| exp_delay.min(m)).unwrap_or(exp_delay);
                capped.min(MAX_BACKOFF)
            }
        }
    }
}

impl Default for Backoff {
    /// Exponential, 1s base, capped at 60s.
    fn default() -> Self {
        Backoff::Exponential { base: Duration::from_secs(1), max: Some(Duration::from_secs(60)) }
    }
}

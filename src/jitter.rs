//! Jitter strategies to keep retrying clients from synchronizing.
//!
//! - `None`: deterministic delays for tests or tightly controlled workflows.
//! - `Full`: uniform in `[0, delay]`, the default for spreading load.
//! - `Equal`: uniform in `[delay/2, delay]`, keeps a floor while randomizing.
//!
//! Millisecond conversions saturate to `u64::MAX` to avoid panics on very
//! large durations. Deterministic RNGs can be injected via `apply_with_rng`.

use rand::{rng, Rng};
use std::time::Duration;

/// Jitter strategy for randomizing retry delays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Jitter {
    /// Use the exact backoff delay.
    None,
    /// Random between 0 and the delay.
    Full,
    /// Random between half the delay and the delay.
    Equal,
}

impl Jitter {
    /// Create a full jitter strategy.
    pub fn full() -> Self {
        Jitter::Full
    }

    /// Create an equal jitter strategy.
    pub fn equal() -> Self {
        Jitter::Equal
    }

    /// Apply jitter to a delay duration.
    pub fn apply(&self, delay: Duration) -> Duration {
        let mut rng = rng();
        self.apply_internal(delay, &mut rng)
    }

    /// Apply jitter with a caller-supplied RNG (for testing).
    pub fn apply_with_rng<R: Rng>(&self, delay: Duration, rng: &mut R) -> Duration {
        self.apply_internal(delay, rng)
    }

    fn as_millis_saturated(duration: Duration) -> u64 {
        duration.as_millis().try_into().unwrap_or(u64::MAX)
    }

    fn apply_internal<R: Rng>(&self, delay: Duration, rng: &mut R) -> Duration {
        let millis = Self::as_millis_saturated(delay);
        match self {
            Jitter::None => delay,
            Jitter::Full => {
                if millis == 0 {
                    return Duration::ZERO;
                }
                Duration::from_millis(rng.random_range(0..=millis))
            }
            Jitter::Equal => {
                if millis == 0 {
                    return Duration::ZERO;
                }
                Duration::from_millis(rng.random_range(millis / 2..=millis))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn none_jitter_returns_exact_delay() {
        let delay = Duration::from_secs(1);
        assert_eq!(Jitter::None.apply(delay), delay);
    }

    #[test]
    fn full_jitter_is_between_zero_and_delay() {
        let delay = Duration::from_secs(1);
        for _ in 0..100 {
            let jittered = Jitter::full().apply(delay);
            assert!(jittered <= delay);
        }
    }

    #[test]
    fn equal_jitter_keeps_half_delay_floor() {
        let delay = Duration::from_secs(1);
        for _ in 0..100 {
            let jittered = Jitter::equal().apply(delay);
            assert!(jittered >= Duration::from_millis(500));
            assert!(jittered <= delay);
        }
    }

    #[test]
    fn deterministic_rng_stays_in_bounds() {
        let mut rng = StdRng::seed_from_u64(42);
        let delay = Duration::from_millis(1000);

        let full = Jitter::full().apply_with_rng(delay, &mut rng);
        assert!(full <= delay);

        let equal = Jitter::equal().apply_with_rng(delay, &mut rng);
        assert!(equal >= Duration::from_millis(500));
        assert!(equal <= delay);
    }

    #[test]
    fn jitter_handles_zero_delay() {
        assert_eq!(Jitter::full().apply(Duration::ZERO), Duration::ZERO);
        assert_eq!(Jitter::equal().apply(Duration::ZERO), Duration::ZERO);
    }

    #[test]
    fn saturates_large_durations_without_panicking() {
        let huge = Duration::from_millis(u64::MAX);
        let mut rng = StdRng::seed_from_u64(999);
        let jittered = Jitter::full().apply_with_rng(huge, &mut rng);
        assert!(jittered <= huge);
    }
}

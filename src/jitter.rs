//! Optional randomization of computed backoff delays.
//!
//! The default is [`Jitter::None`]: the deployed system retries on the exact
//! schedule, and the delay-sequence tests depend on that determinism.
//! [`Jitter::Full`] spreads concurrent sequences uniformly across
//! `[0, delay]` for deployments where synchronized retries would hammer the
//! upstream. Deterministic RNGs can be injected via [`Jitter::apply_with_rng`].

use rand::{rng, Rng};
use std::time::Duration;

/// Jitter strategy for a retry delay.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Jitter {
    /// Use the computed delay as-is.
    #[default]
    None,
    /// Uniform random delay in `[0, delay]`.
    Full,
}

impl Jitter {
    /// Apply this strategy to a computed delay.
    pub fn apply(&self, delay: Duration) -> Duration {
        self.apply_with_rng(delay, &mut rng())
    }

    /// Apply with a caller-supplied RNG, for deterministic tests.
    pub fn apply_with_rng<R: Rng>(&self, delay: Duration, rng: &mut R) -> Duration {
        match self {
            Jitter::None => delay,
            Jitter::Full => {
                // Millisecond resolution; saturate absurd delays rather than panic.
                let millis: u64 = delay.as_millis().try_into().unwrap_or(u64::MAX);
                if millis == 0 {
                    return Duration::ZERO;
                }
                Duration::from_millis(rng.random_range(0..=millis))
            }
        }
    }
}

//! Delay schedules for retried call sequences.
//!
//! Attempt indices are 0-based: attempt `0` is the initial call and incurs no
//! delay; the wait before attempt `k` (`k >= 1`) is `base * multiplier^k` for
//! the exponential schedule. With the default multiplier of 2 and a 1s base,
//! the first retry waits 2s, the second 4s, and so on. Computations saturate
//! at [`MAX_BACKOFF`] instead of overflowing.
//!
//! ```rust
//! use std::time::Duration;
//! use repomuse::Backoff;
//!
//! let backoff = Backoff::exponential(Duration::from_secs(1));
//! assert_eq!(backoff.delay(0), Duration::ZERO);
//! assert_eq!(backoff.delay(1), Duration::from_secs(2));
//! assert_eq!(backoff.delay(2), Duration::from_secs(4));
//! ```

use std::fmt;
use std::time::Duration;

/// Ceiling applied when a computed delay would overflow (1 hour).
pub const MAX_BACKOFF: Duration = Duration::from_secs(60 * 60);

/// Errors returned by backoff configuration.
#[derive(Debug, Clone, PartialEq)]
pub enum BackoffError {
    /// Multiplier must be a finite number >= 1.
    InvalidMultiplier(f64),
    /// `with_max` requires a positive cap no smaller than the base delay.
    InvalidMax { base: Duration, max: Duration },
    /// `with_max` / `with_multiplier` only apply to the exponential schedule.
    NotExponential,
}

impl fmt::Display for BackoffError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackoffError::InvalidMultiplier(m) => {
                write!(f, "multiplier must be finite and >= 1 (got {})", m)
            }
            BackoffError::InvalidMax { base, max } => {
                write!(f, "max ({:?}) must be positive and >= base ({:?})", max, base)
            }
            BackoffError::NotExponential => {
                write!(f, "only the exponential schedule takes a multiplier or cap")
            }
        }
    }
}

impl std::error::Error for BackoffError {}

/// Delay schedule applied between attempts.
#[derive(Debug, Clone, PartialEq)]
pub enum Backoff {
    /// Same delay before every retry.
    Constant(Duration),
    /// `base * multiplier^attempt`, optionally capped.
    Exponential { base: Duration, multiplier: f64, max: Option<Duration> },
}

impl Backoff {
    /// Constant schedule: every retry waits `delay`.
    pub fn constant(delay: Duration) -> Self {
        Backoff::Constant(delay)
    }

    /// Exponential schedule with the default multiplier of 2.
    pub fn exponential(base: Duration) -> Self {
        Backoff::Exponential { base, multiplier: 2.0, max: None }
    }

    /// Override the growth factor. Must be finite and >= 1.
    pub fn with_multiplier(self, multiplier: f64) -> Result<Self, BackoffError> {
        if !multiplier.is_finite() || multiplier < 1.0 {
            return Err(BackoffError::InvalidMultiplier(multiplier));
        }
        match self {
            Backoff::Exponential { base, max, .. } => {
                Ok(Backoff::Exponential { base, multiplier, max })
            }
            Backoff::Constant(_) => Err(BackoffError::NotExponential),
        }
    }

    /// Cap every computed delay at `max`. Must be positive and >= base.
    pub fn with_max(self, max: Duration) -> Result<Self, BackoffError> {
        match self {
            Backoff::Exponential { base, multiplier, .. } => {
                if max.is_zero() || max < base {
                    return Err(BackoffError::InvalidMax { base, max });
                }
                Ok(Backoff::Exponential { base, multiplier, max: Some(max) })
            }
            Backoff::Constant(_) => Err(BackoffError::NotExponential),
        }
    }

    /// Delay before the given 0-based attempt. Attempt 0 is always free.
    pub fn delay(&self, attempt: usize) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }
        match self {
            Backoff::Constant(delay) => *delay,
            Backoff::Exponential { base, multiplier, max } => {
                let exponent = attempt.min(i32::MAX as usize) as i32;
                let scaled = base.as_secs_f64() * multiplier.powi(exponent);
                let raw = if scaled.is_finite() && scaled < MAX_BACKOFF.as_secs_f64() {
                    Duration::from_secs_f64(scaled)
                } else {
                    MAX_BACKOFF
                };
                let capped = max.map(|m| raw.min(m)).unwrap_or(raw);
                capped.min(MAX_BACKOFF)
            }
        }
    }
}

//! Oracle sampling and retry configuration
//!
//! Controls how the move generator talks to the text-generation service and
//! what it does when the service keeps producing unusable text.
//!
//! # Retry Schedule
//!
//! Attempt `n` (0-based) that fails waits `initial_backoff * 2^n`, capped at
//! `max_backoff`, before the next oracle call:
//!
//! | Attempt | Default wait |
//! |---------|--------------|
//! | 0       | 250ms        |
//! | 1       | 500ms        |
//! | 2       | 1s           |
//! | 3       | 2s           |
//! | 4+      | 4s           |
//!
//! After `max_attempts` failures the [`FallbackPolicy`] decides the move.

use clap::ValueEnum;
use std::time::Duration;

/// Fixed sampling parameters sent with every completion request
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplingConfig {
    /// Sampling temperature
    pub temperature: f32,

    /// Completion length cap in tokens
    ///
    /// A move is at most a handful of tokens; a short cap keeps the model
    /// from writing the rest of the game.
    pub max_tokens: u32,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            temperature: 0.5,
            max_tokens: 6,
        }
    }
}

/// What to play once the oracle has exhausted its attempts
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FallbackPolicy {
    /// Play a uniformly random legal move
    RandomLegal,
    /// Resign the game
    Resign,
}

/// Bounded retry schedule for oracle calls
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Oracle calls per move decision, at least 1
    pub max_attempts: u32,

    /// Wait after the first failed attempt
    pub initial_backoff: Duration,

    /// Upper bound for any single wait
    pub max_backoff: Duration,

    /// Applied after `max_attempts` failures
    pub fallback: FallbackPolicy,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 8,
            initial_backoff: Duration::from_millis(250),
            max_backoff: Duration::from_secs(4),
            fallback: FallbackPolicy::RandomLegal,
        }
    }
}

impl RetryPolicy {
    /// Wait before the attempt following failed attempt `attempt` (0-based)
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
        self.initial_backoff
            .checked_mul(factor)
            .unwrap_or(self.max_backoff)
            .min(self.max_backoff)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sampling_defaults() {
        //! Defaults match the completion settings the prompt was tuned for
        let sampling = SamplingConfig::default();
        assert_eq!(sampling.temperature, 0.5);
        assert_eq!(sampling.max_tokens, 6);
    }

    #[test]
    fn test_backoff_doubles_then_caps() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff(0), Duration::from_millis(250));
        assert_eq!(policy.backoff(1), Duration::from_millis(500));
        assert_eq!(policy.backoff(2), Duration::from_secs(1));
        assert_eq!(policy.backoff(3), Duration::from_secs(2));
        assert_eq!(policy.backoff(4), Duration::from_secs(4));
        assert_eq!(policy.backoff(10), Duration::from_secs(4));
    }

    #[test]
    fn test_backoff_survives_huge_attempt_numbers() {
        //! Shift and multiply overflow saturate at the cap instead of panicking
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff(31), policy.max_backoff);
        assert_eq!(policy.backoff(u32::MAX), policy.max_backoff);
    }

    #[test]
    fn test_default_fallback_plays_on() {
        assert_eq!(RetryPolicy::default().fallback, FallbackPolicy::RandomLegal);
    }
}

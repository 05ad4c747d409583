//! How long to wait between attempts, and how many attempts to make.

use rand::Rng;
use std::time::Duration;

/// Retry settings for a session.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Retries allowed after the first attempt.
    pub max_attempts: u32,
    /// The backoff factor each strategy scales.
    pub initial_delay: Duration,
    /// Upper bound for a computed backoff.
    pub max_delay: Duration,
    pub backoff: BackoffStrategy,
    /// Wait for the server's Retry-After instead of the backoff when present.
    pub respect_retry_after: bool,
    /// Upper bound for a Retry-After wait.
    pub max_retry_after: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(60),
            backoff: BackoffStrategy::Linear,
            respect_retry_after: true,
            max_retry_after: Duration::from_secs(300),
        }
    }
}

impl RetryConfig {
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }

    /// Set the backoff factor.
    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    pub fn with_max_retry_after(mut self, delay: Duration) -> Self {
        self.max_retry_after = delay;
        self
    }

    pub fn with_backoff(mut self, backoff: BackoffStrategy) -> Self {
        self.backoff = backoff;
        self
    }

    /// Always use the backoff, even when the server sends Retry-After.
    pub fn ignore_retry_after(mut self) -> Self {
        self.respect_retry_after = false;
        self
    }

    /// A config that never retries.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 0,
            ..Default::default()
        }
    }
}

/// How the wait grows from one retry to the next.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BackoffStrategy {
    /// Every retry waits the backoff factor.
    Constant,
    /// Retry `n` (1-based) waits `n * backoff`.
    Linear,
    /// Retry `n` waits `backoff * factor^(n-1)`.
    Exponential { factor: f64 },
    /// Like `Exponential`, plus a random extra of up to the same amount.
    ExponentialWithJitter { factor: f64 },
}

impl BackoffStrategy {
    /// The wait before retry number `attempt + 1`, never more than
    /// `max_delay`. Results too large to represent come out as `max_delay`.
    pub fn delay(&self, attempt: u32, initial_delay: Duration, max_delay: Duration) -> Duration {
        let power = i32::try_from(attempt).unwrap_or(i32::MAX);
        let delay = match *self {
            BackoffStrategy::Constant => Some(initial_delay),
            BackoffStrategy::Linear => initial_delay.checked_mul(attempt.saturating_add(1)),
            BackoffStrategy::Exponential { factor } => scale(initial_delay, factor.powi(power)),
            BackoffStrategy::ExponentialWithJitter { factor } => {
                let jitter = 1.0 + rand::rng().random::<f64>();
                scale(initial_delay, factor.powi(power) * jitter)
            }
        };
        delay.map_or(max_delay, |delay| delay.min(max_delay))
    }
}

fn scale(delay: Duration, multiplier: f64) -> Option<Duration> {
    Duration::try_from_secs_f64(delay.as_secs_f64() * multiplier).ok()
}

/// Tracks the retries of one request.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    config: RetryConfig,
    attempt: u32,
}

impl RetryPolicy {
    pub fn new(config: RetryConfig) -> Self {
        Self { config, attempt: 0 }
    }

    /// Retries scheduled so far.
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    pub fn should_retry(&self) -> bool {
        self.attempt < self.config.max_attempts
    }

    /// Schedule a retry and return how long to wait for it, or None when
    /// no retries are left.
    ///
    /// A server supplied `retry_after` wins over the backoff, capped at
    /// `max_retry_after`.
    pub fn next_delay(&mut self, retry_after: Option<Duration>) -> Option<Duration> {
        if !self.should_retry() {
            return None;
        }

        let config = &self.config;
        let delay = match retry_after.filter(|_| config.respect_retry_after) {
            Some(wait) => wait.min(config.max_retry_after),
            None => config
                .backoff
                .delay(self.attempt, config.initial_delay, config.max_delay),
        };

        self.attempt += 1;
        Some(delay)
    }
}

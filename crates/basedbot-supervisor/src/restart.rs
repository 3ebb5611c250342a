//! Restart policies
//!
//! The default is to restart immediately and forever. Backoff and the
//! circuit breaker are opt-in.

use backoff::backoff::Backoff;
use backoff::{ExponentialBackoff, ExponentialBackoffBuilder};
use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Delay between a child stopping and its next start
#[derive(Debug, Clone, Default, PartialEq)]
pub enum RestartPolicy {
    /// Restart right away
    #[default]
    Immediate,
    /// Exponential backoff with jitter
    Backoff(BackoffConfig),
}

/// Exponential backoff parameters
#[derive(Debug, Clone, PartialEq)]
pub struct BackoffConfig {
    pub initial_interval: Duration,
    pub max_interval: Duration,
    pub multiplier: f64,
    pub randomization_factor: f64,

    /// A run at least this long resets the delay to `initial_interval`
    pub reset_after: Duration,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            initial_interval: Duration::from_millis(500),
            max_interval: Duration::from_secs(60),
            multiplier: 2.0,
            randomization_factor: 0.3,
            reset_after: Duration::from_secs(120),
        }
    }
}

impl BackoffConfig {
    fn build(&self) -> ExponentialBackoff {
        ExponentialBackoffBuilder::new()
            .with_initial_interval(self.initial_interval)
            .with_max_interval(self.max_interval)
            .with_multiplier(self.multiplier)
            .with_randomization_factor(self.randomization_factor)
            .with_max_elapsed_time(None)
            .build()
    }
}

/// Give up on a child that restarts more than `max_restarts` times within
/// `window`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CircuitBreaker {
    pub max_restarts: usize,
    pub window: Duration,
}

/// Per-child restart bookkeeping
pub(crate) struct RestartTracker {
    policy: RestartPolicy,
    backoff: Option<ExponentialBackoff>,
    breaker: Option<CircuitBreaker>,
    recent: VecDeque<Instant>,
}

impl RestartTracker {
    pub(crate) fn new(policy: RestartPolicy, breaker: Option<CircuitBreaker>) -> Self {
        let backoff = match &policy {
            RestartPolicy::Immediate => None,
            RestartPolicy::Backoff(config) => Some(config.build()),
        };
        Self {
            policy,
            backoff,
            breaker,
            recent: VecDeque::new(),
        }
    }

    /// Delay before the next start, or `None` when the breaker has tripped.
    /// `ran_for` is how long the run that just ended lasted.
    pub(crate) fn next_delay(&mut self, ran_for: Duration) -> Option<Duration> {
        self.next_delay_at(Instant::now(), ran_for)
    }

    fn next_delay_at(&mut self, now: Instant, ran_for: Duration) -> Option<Duration> {
        if let Some(breaker) = self.breaker {
            while self
                .recent
                .front()
                .is_some_and(|t| now.duration_since(*t) > breaker.window)
            {
                self.recent.pop_front();
            }
            if self.recent.len() >= breaker.max_restarts {
                return None;
            }
            self.recent.push_back(now);
        }

        match (&self.policy, self.backoff.as_mut()) {
            (RestartPolicy::Backoff(config), Some(backoff)) => {
                if ran_for >= config.reset_after {
                    backoff.reset();
                }
                Some(backoff.next_backoff().unwrap_or(config.max_interval))
            }
            _ => Some(Duration::ZERO),
        }
    }
}

use rand::Rng;
use std::time::Duration;

/// Trait for defining reconnection strategies
///
/// Consulted by the session task after a failed attempt or a dropped
/// session.
pub trait ReconnectionStrategy: Send + Sync {
    /// Get the delay before the next reconnection attempt
    ///
    /// # Arguments
    /// * `attempt` - The reconnection attempt number (0-indexed)
    ///
    /// # Returns
    /// * `Some(duration)` - Wait this long before reconnecting
    /// * `None` - Stop reconnecting
    fn next_delay(&self, attempt: usize) -> Option<Duration>;

    /// Check if we should continue reconnecting
    fn should_reconnect(&self, attempt: usize) -> bool;
}

/// Exponential backoff reconnection strategy
///
/// The delay for attempt `n` is `initial_delay * 2^n` capped at
/// `max_delay`, then moved by up to `± randomization_factor` of itself.
/// The jittered delay never exceeds `max_delay`.
#[derive(Debug, Clone)]
pub struct ExponentialBackoff {
    initial_delay: Duration,
    max_delay: Duration,
    max_attempts: Option<usize>,
    randomization_factor: f64,
}

impl ExponentialBackoff {
    /// Create a new exponential backoff strategy without jitter
    ///
    /// # Arguments
    /// * `initial_delay` - The initial delay before first reconnect
    /// * `max_delay` - The maximum delay between reconnects
    /// * `max_attempts` - Maximum number of attempts (None = unlimited)
    pub fn new(initial_delay: Duration, max_delay: Duration, max_attempts: Option<usize>) -> Self {
        Self {
            initial_delay,
            max_delay,
            max_attempts,
            randomization_factor: 0.0,
        }
    }

    /// Set the jitter factor, clamped to `0.0..=1.0`
    pub fn with_randomization(mut self, factor: f64) -> Self {
        self.randomization_factor = if factor.is_finite() {
            factor.clamp(0.0, 1.0)
        } else {
            0.0
        };
        self
    }

    fn base_delay_ms(&self, attempt: usize) -> u64 {
        let initial = self.initial_delay.as_millis() as u64;
        let factor = 1u64.checked_shl(attempt as u32).unwrap_or(u64::MAX);
        initial
            .saturating_mul(factor)
            .min(self.max_delay.as_millis() as u64)
    }
}

impl ReconnectionStrategy for ExponentialBackoff {
    fn next_delay(&self, attempt: usize) -> Option<Duration> {
        if !self.should_reconnect(attempt) {
            return None;
        }

        let base = self.base_delay_ms(attempt) as f64;
        if self.randomization_factor == 0.0 {
            return Some(Duration::from_millis(base as u64));
        }

        let spread = rand::thread_rng().gen_range(-1.0..=1.0) * self.randomization_factor;
        let jittered = (base * (1.0 + spread)).clamp(0.0, self.max_delay.as_millis() as f64);
        Some(Duration::from_millis(jittered as u64))
    }

    fn should_reconnect(&self, attempt: usize) -> bool {
        self.max_attempts.map_or(true, |max| attempt < max)
    }
}

/// Fixed delay reconnection strategy
///
/// Always waits the same amount of time between reconnection attempts
#[derive(Debug, Clone)]
pub struct FixedDelay {
    delay: Duration,
    max_attempts: Option<usize>,
}

impl FixedDelay {
    pub fn new(delay: Duration, max_attempts: Option<usize>) -> Self {
        Self { delay, max_attempts }
    }
}

impl ReconnectionStrategy for FixedDelay {
    fn next_delay(&self, attempt: usize) -> Option<Duration> {
        if !self.should_reconnect(attempt) {
            return None;
        }
        Some(self.delay)
    }

    fn should_reconnect(&self, attempt: usize) -> bool {
        self.max_attempts.map_or(true, |max| attempt < max)
    }
}

/// Never reconnect strategy
///
/// A dropped session ends the client; a failed initial attempt is final.
#[derive(Debug, Clone)]
pub struct NeverReconnect;

impl ReconnectionStrategy for NeverReconnect {
    fn next_delay(&self, _attempt: usize) -> Option<Duration> {
        None
    }

    fn should_reconnect(&self, _attempt: usize) -> bool {
        false
    }
}

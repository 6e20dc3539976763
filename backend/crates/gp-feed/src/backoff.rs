use gp_config::ChangeFeedConfig;

use std::time::Duration;

/// Exponential reconnect delay with uniform jitter.
///
/// The nominal delay for attempt `n` (starting at 0) is `base * 2^n`, capped
/// at `max`. Every returned delay is the nominal one scaled by a factor drawn
/// from `[1 - jitter, 1 + jitter]`.
#[derive(Debug, Clone)]
pub struct Backoff {
    base: Duration,
    max: Duration,
    jitter: f64,
    attempt: u32,
}

impl Backoff {
    pub fn new(base: Duration, max: Duration, jitter: f64) -> Self {
        Self {
            base,
            max: max.max(base),
            jitter: jitter.clamp(0.0, 1.0),
            attempt: 0,
        }
    }

    pub fn from_config(config: &ChangeFeedConfig) -> Self {
        Self::new(
            Duration::from_millis(config.backoff_base_ms),
            Duration::from_secs(config.backoff_max_secs),
            config.jitter,
        )
    }

    /// Un-jittered delay for `attempt`
    pub fn nominal(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.min(31));
        self.base.saturating_mul(factor).min(self.max)
    }

    /// Delay before the next reconnect; advances the attempt counter.
    pub fn next_delay(&mut self) -> Duration {
        let nominal = self.nominal(self.attempt);
        self.attempt = self.attempt.saturating_add(1);

        let factor = 1.0 - self.jitter + 2.0 * self.jitter * rand::random::<f64>();
        Duration::from_secs_f64(nominal.as_secs_f64() * factor)
    }

    pub fn reset(&mut self) {
        self.attempt = 0;
    }

    pub fn attempt(&self) -> u32 {
        self.attempt
    }
}

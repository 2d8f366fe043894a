//! Capped exponential reconnect backoff

use std::time::Duration;
use visage_core::RelayConfig;

#[derive(Debug, Clone)]
pub struct Backoff {
    initial: Duration,
    max: Duration,
    factor: f64,
    current: Duration,
}

impl Backoff {
    pub fn new(initial: Duration, factor: f64, max: Duration) -> Self {
        let factor = if factor.is_finite() && factor >= 1.0 { factor } else { 1.0 };
        let initial = initial.min(max);
        Self {
            initial,
            max,
            factor,
            current: initial,
        }
    }

    pub fn from_config(config: &RelayConfig) -> Self {
        Self::new(config.initial_backoff(), config.backoff_factor, config.max_backoff())
    }

    /// Delay to wait now; grows the delay used next time
    pub fn next_delay(&mut self) -> Duration {
        let delay = self.current;
        self.current = self.current.mul_f64(self.factor).min(self.max);
        delay
    }

    /// Back to the initial delay after a successful connect
    pub fn reset(&mut self) {
        self.current = self.initial;
    }

    pub fn current(&self) -> Duration {
        self.current
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Self::from_config(&RelayConfig::default())
    }
}

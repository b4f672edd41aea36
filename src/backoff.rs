//! Exponential reconnect backoff with randomized jitter.
//!
//! `delay(n) = min(base * 2^n ± rand * jitter * base * 2^n, max)`

use std::time::Duration;

use rand::Rng;

use crate::config::ReconnectPolicy;

/// Doubling exponent stops growing here; `2^32` seconds is already far past
/// any sane `max_delay`.
const MAX_EXPONENT: u32 = 32;

#[derive(Debug, Clone)]
pub struct Backoff {
    policy: ReconnectPolicy,
    attempts: u32,
}

impl Backoff {
    #[must_use]
    pub fn new(policy: ReconnectPolicy) -> Self {
        Self { policy, attempts: 0 }
    }

    /// Delays handed out since the last reset.
    #[must_use]
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn reset(&mut self) {
        self.attempts = 0;
    }

    /// Next delay using the thread-local RNG.
    pub fn next_delay(&mut self) -> Duration {
        self.next_delay_with(&mut rand::rng())
    }

    /// Next delay drawing jitter from `rng`.
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_possible_wrap,
        clippy::cast_sign_loss
    )]
    pub fn next_delay_with<R: Rng>(&mut self, rng: &mut R) -> Duration {
        let exponent = self.attempts.min(MAX_EXPONENT);
        self.attempts = self.attempts.saturating_add(1);

        let base_ms = self.policy.base_delay.as_millis() as f64;
        let max_ms = self.policy.max_delay.as_millis() as f64;
        let mut ms = base_ms * 2_f64.powi(exponent as i32);

        if self.policy.jitter > 0.0 {
            let deviation = (rng.random::<f64>() * self.policy.jitter * ms).floor();
            if rng.random_bool(0.5) {
                ms += deviation;
            } else {
                ms -= deviation;
            }
        }

        Duration::from_millis(ms.clamp(0.0, max_ms) as u64)
    }
}

#[cfg(test)]
#[path = "backoff_test.rs"]
mod tests;

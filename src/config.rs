//! Client configuration parsed from environment variables.
//!
//! Defaults mirror the dashboard client this crate serves: ten reconnect
//! attempts starting at one second, capped at ten seconds, with 50% jitter,
//! and a 100-event history.

use std::time::Duration;

use crate::history::DEFAULT_HISTORY_CAPACITY;

pub const DEFAULT_ENDPOINT: &str = "ws://127.0.0.1:5000/ws";
pub const DEFAULT_RECONNECT_ATTEMPTS: u32 = 10;
pub const DEFAULT_RECONNECT_DELAY_MS: u64 = 1_000;
pub const DEFAULT_RECONNECT_DELAY_MAX_MS: u64 = 10_000;
pub const DEFAULT_RECONNECT_JITTER: f64 = 0.5;

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ConfigError {
    #[error("endpoint must not be empty")]
    EmptyEndpoint,
    #[error("reconnect base delay ({base_ms}ms) exceeds max delay ({max_ms}ms)")]
    InvalidDelays { base_ms: u128, max_ms: u128 },
    #[error("reconnect jitter must be within 0.0..=1.0, got {0}")]
    InvalidJitter(f64),
    #[error("history capacity must be at least 1")]
    ZeroHistoryCapacity,
}

/// Retry policy handed to the transport on `connect`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReconnectPolicy {
    /// Consecutive failed attempts tolerated before giving up. `0` disables
    /// automatic reconnection.
    pub max_attempts: u32,
    /// Delay before the first retry; doubles on each further attempt.
    pub base_delay: Duration,
    /// Upper bound for any single delay.
    pub max_delay: Duration,
    /// Randomization factor in `0.0..=1.0` applied to each delay.
    pub jitter: f64,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_RECONNECT_ATTEMPTS,
            base_delay: Duration::from_millis(DEFAULT_RECONNECT_DELAY_MS),
            max_delay: Duration::from_millis(DEFAULT_RECONNECT_DELAY_MAX_MS),
            jitter: DEFAULT_RECONNECT_JITTER,
        }
    }
}

impl ReconnectPolicy {
    /// Check internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the base delay exceeds the max delay or
    /// the jitter factor is out of range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.base_delay > self.max_delay {
            return Err(ConfigError::InvalidDelays {
                base_ms: self.base_delay.as_millis(),
                max_ms: self.max_delay.as_millis(),
            });
        }
        if !(0.0..=1.0).contains(&self.jitter) {
            return Err(ConfigError::InvalidJitter(self.jitter));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// Transport endpoint, e.g. `ws://host:5000/ws`.
    pub endpoint: String,
    pub reconnect: ReconnectPolicy,
    /// Maximum number of events kept in history.
    pub history_capacity: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_owned(),
            reconnect: ReconnectPolicy::default(),
            history_capacity: DEFAULT_HISTORY_CAPACITY,
        }
    }
}

impl ClientConfig {
    #[must_use]
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self { endpoint: endpoint.into(), ..Self::default() }
    }

    /// Build typed client config from environment variables.
    ///
    /// Optional:
    /// - `LIVEFEED_URL`: default `ws://127.0.0.1:5000/ws`
    /// - `LIVEFEED_RECONNECT_ATTEMPTS`: default 10
    /// - `LIVEFEED_RECONNECT_DELAY_MS`: default 1000
    /// - `LIVEFEED_RECONNECT_DELAY_MAX_MS`: default 10000
    /// - `LIVEFEED_RECONNECT_JITTER`: default 0.5
    /// - `LIVEFEED_HISTORY_CAPACITY`: default 100
    ///
    /// Unparsable values fall back to their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the resulting config is inconsistent.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`ClientConfig::from_env`] with an explicit variable lookup.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the resulting config is inconsistent.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let endpoint = lookup("LIVEFEED_URL")
            .map(|v| v.trim().to_owned())
            .unwrap_or_else(|| DEFAULT_ENDPOINT.to_owned());

        let reconnect = ReconnectPolicy {
            max_attempts: lookup_parse(&lookup, "LIVEFEED_RECONNECT_ATTEMPTS", DEFAULT_RECONNECT_ATTEMPTS),
            base_delay: Duration::from_millis(lookup_parse(
                &lookup,
                "LIVEFEED_RECONNECT_DELAY_MS",
                DEFAULT_RECONNECT_DELAY_MS,
            )),
            max_delay: Duration::from_millis(lookup_parse(
                &lookup,
                "LIVEFEED_RECONNECT_DELAY_MAX_MS",
                DEFAULT_RECONNECT_DELAY_MAX_MS,
            )),
            jitter: lookup_parse(&lookup, "LIVEFEED_RECONNECT_JITTER", DEFAULT_RECONNECT_JITTER),
        };

        let config = Self {
            endpoint,
            reconnect,
            history_capacity: lookup_parse(&lookup, "LIVEFEED_HISTORY_CAPACITY", DEFAULT_HISTORY_CAPACITY),
        };
        config.validate()?;
        Ok(config)
    }

    /// # Errors
    ///
    /// Returns [`ConfigError`] for an empty endpoint, a zero history
    /// capacity, or an invalid policy.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.endpoint.is_empty() {
            return Err(ConfigError::EmptyEndpoint);
        }
        if self.history_capacity == 0 {
            return Err(ConfigError::ZeroHistoryCapacity);
        }
        self.reconnect.validate()
    }
}

fn lookup_parse<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr + Copy,
{
    lookup(key)
        .and_then(|v| v.trim().parse::<T>().ok())
        .unwrap_or(default)
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;

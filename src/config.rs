//! Tunables for conflict retry, id validation, and the event stream.

use std::time::Duration;

use serde::Deserialize;

use crate::{error::LotteryError, types::DEFAULT_MAX_ID_LEN};

/// Bound and backoff for retrying a transaction that lost a write race.
///
/// Delays grow as `initial_delay_ms * multiplier^n`, capped at `max_delay_ms`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Retries after the first attempt; total attempts is one more.
    pub max_retries: usize,
    /// Delay before the first retry.
    pub initial_delay_ms: u64,
    /// Upper bound on any single delay.
    pub max_delay_ms: u64,
    /// Growth factor between consecutive delays.
    pub multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 5,
            initial_delay_ms: 2,
            max_delay_ms: 50,
            multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    /// Policy that retries `max_retries` times without sleeping.
    pub fn immediate(max_retries: usize) -> Self {
        Self {
            max_retries,
            initial_delay_ms: 0,
            max_delay_ms: 0,
            multiplier: 1.0,
        }
    }

    /// Total read-compute-commit attempts allowed.
    pub fn max_attempts(&self) -> usize {
        self.max_retries.saturating_add(1)
    }

    /// Backoff before retry number `retry` (zero-based).
    pub fn delay_for_retry(&self, retry: usize) -> Duration {
        let exp = i32::try_from(retry).unwrap_or(i32::MAX);
        let delay_ms = self.initial_delay_ms as f64 * self.multiplier.powi(exp);
        let capped = delay_ms.min(self.max_delay_ms as f64).max(0.0);
        Duration::from_millis(capped as u64)
    }
}

/// Top-level lottery configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LotteryConfig {
    /// Conflict retry policy for every transition.
    pub retry: RetryPolicy,
    /// Buffer size of the runtime's broadcast event channel.
    pub event_channel_capacity: usize,
    /// Longest accepted event or entrant id, in bytes.
    pub max_id_len: usize,
}

impl Default for LotteryConfig {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            event_channel_capacity: 1024,
            max_id_len: DEFAULT_MAX_ID_LEN,
        }
    }
}

impl LotteryConfig {
    /// Parses a JSON document; missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, LotteryError> {
        let cfg: Self = serde_json::from_str(json)
            .map_err(|err| LotteryError::InvalidArgument(format!("config: {err}")))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Rejects settings the runtime cannot operate with.
    pub fn validate(&self) -> Result<(), LotteryError> {
        if self.event_channel_capacity == 0 {
            return Err(LotteryError::InvalidArgument(
                "config: event_channel_capacity must be positive".to_string(),
            ));
        }
        if self.max_id_len == 0 {
            return Err(LotteryError::InvalidArgument(
                "config: max_id_len must be positive".to_string(),
            ));
        }
        if !self.retry.multiplier.is_finite() || self.retry.multiplier < 1.0 {
            return Err(LotteryError::InvalidArgument(
                "config: retry.multiplier must be finite and at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

//! Driver timing and policy configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use garagelink_core::constants::{
    DEFAULT_ACK_TIMEOUT_MS, DEFAULT_MAX_RETRIES, DEFAULT_POLL_INTERVAL_MS,
    DEFAULT_TICK_INTERVAL_MS,
};

/// Configuration for the garage door driver.
///
/// All fields have defaults matching the controller's observed timing, so
/// a config file only needs to name what it changes:
///
/// ```
/// use garagelink_driver::DriverConfig;
///
/// let config: DriverConfig = serde_json::from_str(r#"{"ack_timeout_ms": 500}"#).unwrap();
/// assert_eq!(config.ack_timeout().as_millis(), 500);
/// assert_eq!(config.max_retries, 2);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverConfig {
    /// How long to wait for a command acknowledgment before retransmitting.
    pub ack_timeout_ms: u64,

    /// Retransmissions before a command is abandoned.
    ///
    /// A command is sent once and retransmitted up to this many times, so
    /// the controller sees at most `max_retries + 1` copies.
    pub max_retries: u8,

    /// Reject a new request for a switch that already has a command in
    /// flight, instead of superseding it.
    pub strict_single_flight: bool,

    /// How often to ask the controller for a full status report.
    pub poll_interval_ms: u64,

    /// Scheduler tick driving link polling and timeout checks.
    pub tick_interval_ms: u64,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            ack_timeout_ms: DEFAULT_ACK_TIMEOUT_MS,
            max_retries: DEFAULT_MAX_RETRIES,
            strict_single_flight: false,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            tick_interval_ms: DEFAULT_TICK_INTERVAL_MS,
        }
    }
}

impl DriverConfig {
    /// Ack timeout as a [`Duration`].
    #[must_use]
    pub fn ack_timeout(&self) -> Duration {
        Duration::from_millis(self.ack_timeout_ms)
    }

    /// Status poll interval as a [`Duration`].
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Scheduler tick interval as a [`Duration`].
    #[must_use]
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

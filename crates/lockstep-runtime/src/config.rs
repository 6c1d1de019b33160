//! Runtime configuration

use std::time::Duration;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::*;

/// Lockstep runtime parameters
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct RuntimeConfig {
    /// Upper bound on a single blocking receive (ms)
    pub receive_timeout_ms: u64,
    /// Capacity of each wiring-edge channel
    pub channel_capacity: usize,
    /// Log progress every N ticks (0 disables)
    pub progress_interval: u64,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            receive_timeout_ms: 5_000,
            channel_capacity: 1,
            progress_interval: 0,
        }
    }
}

impl RuntimeConfig {
    /// Create a configuration with validation
    pub fn new(receive_timeout_ms: u64, channel_capacity: usize) -> Result<Self> {
        if receive_timeout_ms == 0 {
            return Err(RuntimeError::invalid_parameter(
                "receive_timeout_ms",
                receive_timeout_ms.to_string(),
                "> 0",
            ));
        }
        if channel_capacity == 0 {
            return Err(RuntimeError::invalid_parameter(
                "channel_capacity",
                channel_capacity.to_string(),
                ">= 1",
            ));
        }

        Ok(Self {
            receive_timeout_ms,
            channel_capacity,
            ..Default::default()
        })
    }

    /// Set the receive timeout
    pub fn with_receive_timeout(mut self, timeout: Duration) -> Self {
        self.receive_timeout_ms = timeout.as_millis() as u64;
        self
    }

    /// Set the progress logging interval
    pub fn with_progress_interval(mut self, ticks: u64) -> Self {
        self.progress_interval = ticks;
        self
    }

    /// Receive timeout as a duration
    pub fn receive_timeout(&self) -> Duration {
        Duration::from_millis(self.receive_timeout_ms)
    }

    /// Validate parameters
    pub fn validate(&self) -> Result<()> {
        Self::new(self.receive_timeout_ms, self.channel_capacity)?;
        Ok(())
    }
}

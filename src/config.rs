//! Firmware configuration parameters
//!
//! Timing and fault-tolerance knobs for the Ladybug main loop and the
//! guarded storage layer.  Persisted record layouts are fixed at compile
//! time and live in [`crate::records`] / [`crate::storage`], not here.

use core::time::Duration;

use serde::{Deserialize, Serialize};

use crate::storage::REGION_COUNT;

/// Guarded requests in one full write-back cycle: a clear and a store
/// for every region.
const WRITEBACK_OPS: u32 = 2 * REGION_COUNT as u32;

/// Core firmware configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FirmwareConfig {
    // --- Storage ---
    /// How long a single flash operation may take before it is abandoned.
    pub storage_timeout_ms: u32,
    /// Consecutive failed write-back cycles tolerated before a controlled restart.
    pub max_storage_failures: u8,

    // --- Timing ---
    /// Interval between write-back polls of the dirty records (milliseconds)
    pub writeback_interval_ms: u32,
    /// Main loop sleep between iterations (milliseconds)
    pub loop_interval_ms: u32,
    /// Task watchdog timeout (milliseconds)
    pub watchdog_timeout_ms: u32,
}

impl Default for FirmwareConfig {
    fn default() -> Self {
        Self {
            // Storage
            storage_timeout_ms: 5_000,
            max_storage_failures: 3,

            // Timing
            writeback_interval_ms: 1_000,
            loop_interval_ms: 100,
            watchdog_timeout_ms: 35_000,
        }
    }
}

impl FirmwareConfig {
    /// Watchdog window for a single storage operation.
    pub fn storage_timeout(&self) -> Duration {
        Duration::from_millis(u64::from(self.storage_timeout_ms))
    }

    /// Longest the main loop can go between watchdog feeds: a write-back
    /// of every record, each request running to its timeout, plus one
    /// loop sleep.
    pub fn worst_case_stall_ms(&self) -> u32 {
        self.storage_timeout_ms
            .saturating_mul(WRITEBACK_OPS)
            .saturating_add(self.loop_interval_ms)
    }

    /// Range-check every field.  Invalid values are rejected, never clamped.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(100..=60_000).contains(&self.storage_timeout_ms) {
            return Err(ConfigError::ValidationFailed(
                "storage_timeout_ms must be 100–60000",
            ));
        }
        if self.max_storage_failures == 0 {
            return Err(ConfigError::ValidationFailed(
                "max_storage_failures must be at least 1",
            ));
        }
        if !(10..=10_000).contains(&self.loop_interval_ms) {
            return Err(ConfigError::ValidationFailed(
                "loop_interval_ms must be 10–10000",
            ));
        }
        if self.writeback_interval_ms < self.loop_interval_ms {
            return Err(ConfigError::ValidationFailed(
                "writeback_interval_ms must be >= loop_interval_ms",
            ));
        }
        if self.watchdog_timeout_ms <= self.worst_case_stall_ms() {
            return Err(ConfigError::ValidationFailed(
                "watchdog_timeout_ms must outlast a full write-back cycle",
            ));
        }
        Ok(())
    }
}

/// Errors from [`FirmwareConfig::validate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// A field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
        }
    }
}

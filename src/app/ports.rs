//! Port traits — the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ HydroService (domain)
//! ```
//!
//! Driven adapters (analog front-end, flash, clock, notification sinks)
//! implement these traits.  The [`HydroService`](super::service::HydroService)
//! consumes them via generics, so the domain core never touches hardware
//! directly.
//!
//! All port errors are typed and `Copy` — callers must handle every
//! variant explicitly.

use crate::records::Block;
use crate::storage::RecordKind;

use super::events::Notification;

// ───────────────────────────────────────────────────────────────
// Analog port (driven adapter: ADC → domain)
// ───────────────────────────────────────────────────────────────

/// Highest analog input channel on the sensor board.
pub const MAX_ANALOG_CHANNEL: u8 = 7;

/// Synchronous analog sampling.  Blocks for the hardware sampling interval.
pub trait AnalogPort {
    /// Sample `channel` (0..=7) and return the reading in millivolts.
    fn read_mv(&mut self, channel: u8) -> Result<i16, SensorError>;
}

// ───────────────────────────────────────────────────────────────
// Probe port (driven adapter: hydro front-end → domain)
// ───────────────────────────────────────────────────────────────

/// Probe-level readings built on top of raw analog samples.
pub trait ProbePort {
    /// pH electrode potential relative to its virtual ground.
    fn read_ph_mv(&mut self) -> Result<i16, SensorError>;

    /// EC rectifier outputs `[vin, vout]` relative to the EC virtual ground.
    fn read_ec_mv(&mut self) -> Result<[i16; 2], SensorError>;

    /// Battery voltage in millivolts.
    fn read_battery_mv(&mut self) -> Result<u16, SensorError>;
}

// ───────────────────────────────────────────────────────────────
// Clock port
// ───────────────────────────────────────────────────────────────

/// Monotonic time source used to bound storage operations.
pub trait MonotonicClock {
    /// Microseconds since boot.
    fn now_us(&self) -> u64;
}

// ───────────────────────────────────────────────────────────────
// Block storage port (domain ↔ guarded flash regions)
// ───────────────────────────────────────────────────────────────

/// Persistence as the record layer sees it: one fixed-size block per
/// record kind, read whole and rewritten whole.
///
/// Implementations must clear a region before storing into it and must
/// never leave a call blocked indefinitely.
pub trait BlockStoragePort {
    /// Read the full block backing `kind`.
    fn load_block(&mut self, kind: RecordKind) -> Result<Block, StorageError>;

    /// Erase the block backing `kind`, then write `bytes` at offset 0.
    fn clear_then_store(&mut self, kind: RecordKind, bytes: &[u8]) -> Result<(), StorageError>;
}

// ───────────────────────────────────────────────────────────────
// Notification port (domain → wireless link)
// ───────────────────────────────────────────────────────────────

/// The domain pushes updated values through this port.  Adapters decide
/// where they go (GATT notification, serial log, test recorder).
pub trait NotifySink {
    fn notify(&mut self, notification: &Notification);
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Raw status code reported by the underlying storage service.
/// Zero means success.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceCode(pub i32);

impl ServiceCode {
    pub const SUCCESS: Self = Self(0);
    /// A load completed with fewer bytes than requested.
    pub const SHORT_READ: Self = Self(-1);

    pub const fn is_success(self) -> bool {
        self.0 == 0
    }
}

/// Errors from [`BlockStoragePort`] and the guarded storage layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageError {
    /// The completion never arrived within the watchdog window.
    TimedOut,
    /// The service rejected the request or completed it with a failure status.
    Service(ServiceCode),
    /// Bad arguments: empty buffer, oversized write, unknown region.
    InvalidInput(&'static str),
    /// Regions could not be reserved at start-up.
    Registration(ServiceCode),
}

/// Errors from [`AnalogPort`] / [`ProbePort`] reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    /// Channel outside 0..=7.
    InvalidChannel(u8),
    /// ADC conversion failed.
    AdcReadFailed,
    /// FET discharge pin could not be driven.
    GpioWriteFailed,
}

impl core::fmt::Display for ServiceCode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "status {}", self.0)
    }
}

impl core::fmt::Display for StorageError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::TimedOut => write!(f, "storage operation timed out"),
            Self::Service(code) => write!(f, "storage service error ({})", code),
            Self::InvalidInput(msg) => write!(f, "invalid storage request: {}", msg),
            Self::Registration(code) => write!(f, "region registration failed ({})", code),
        }
    }
}

impl core::fmt::Display for SensorError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::InvalidChannel(ch) => write!(f, "invalid analog channel {}", ch),
            Self::AdcReadFailed => write!(f, "ADC read failed"),
            Self::GpioWriteFailed => write!(f, "GPIO write failed"),
        }
    }
}

//! Unified error type for the Ladybug firmware.
//!
//! Every subsystem keeps its own small `Copy` error enum; this type wraps
//! them so the top-level control loop handles errors uniformly.

use core::fmt;

use crate::app::commands::CommandError;
use crate::app::ports::{SensorError, StorageError};
use crate::config::ConfigError;
use crate::records::RecordError;

/// Every fallible operation in the firmware funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A guarded storage operation failed or timed out.
    Storage(StorageError),
    /// A probe or battery read failed.
    Sensor(SensorError),
    /// A control frame could not be decoded.
    Command(CommandError),
    /// A record mutation was rejected.
    Record(RecordError),
    /// Configuration is out of range.
    Config(ConfigError),
}

impl Error {
    /// Whether this error came from the persistence layer.
    pub const fn is_storage(&self) -> bool {
        matches!(self, Self::Storage(_))
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Storage(e) => write!(f, "storage: {e}"),
            Self::Sensor(e) => write!(f, "sensor: {e}"),
            Self::Command(e) => write!(f, "command: {e}"),
            Self::Record(e) => write!(f, "record: {e}"),
            Self::Config(e) => write!(f, "config: {e}"),
        }
    }
}

impl From<StorageError> for Error {
    fn from(e: StorageError) -> Self {
        Self::Storage(e)
    }
}

impl From<SensorError> for Error {
    fn from(e: SensorError) -> Self {
        Self::Sensor(e)
    }
}

impl From<CommandError> for Error {
    fn from(e: CommandError) -> Self {
        Self::Command(e)
    }
}

impl From<RecordError> for Error {
    fn from(e: RecordError) -> Self {
        Self::Record(e)
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

impl std::error::Error for Error {}

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;

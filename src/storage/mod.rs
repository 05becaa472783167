//! Block storage manager.
//!
//! Maps each logical record kind onto one fixed-size region of
//! non-volatile memory and turns the vendor's fire-and-forget storage API
//! into bounded, blocking operations.
//!
//! ```text
//!  RecordStore ──▶ BlockStoragePort ──▶ GuardedStorage ──▶ StorageService
//!                                        │  watchdog          (async, completes
//!                                        │  in-flight marker   via notifier)
//!                                        └─ RegionRegistry
//! ```

pub mod guarded;
pub mod region;
pub mod service;

pub use guarded::{GuardedStorage, StorageOp};
pub use region::RegionRegistry;
pub use service::{
    Completion, CompletionNotifier, OpCode, Region, RegionBlock, StorageService,
};

/// Byte length of every region, sized to the largest record
/// (plant info: 4-byte sentinel + 28-byte payload).
pub const BLOCK_SIZE: usize = 32;

/// Number of regions reserved at start-up, one per [`RecordKind`].
pub const REGION_COUNT: usize = 3;

/// Logical record kinds, each backed by exactly one region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    Calibration,
    PlantInfo,
    DeviceName,
}

impl RecordKind {
    /// Every kind, in write-back poll order.
    pub const ALL: [RecordKind; REGION_COUNT] = [
        RecordKind::Calibration,
        RecordKind::PlantInfo,
        RecordKind::DeviceName,
    ];

    /// Position of this kind's region inside the registered block set.
    pub const fn index(self) -> usize {
        match self {
            Self::Calibration => 0,
            Self::PlantInfo => 1,
            Self::DeviceName => 2,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Calibration => "calibration",
            Self::PlantInfo => "plant-info",
            Self::DeviceName => "device-name",
        }
    }
}

impl core::fmt::Display for RecordKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

//! Record state managers.
//!
//! Every persisted record is a 4-byte little-endian write-check sentinel
//! followed by a kind-specific payload:
//!
//! ```text
//!  0        4                                   BLOCK_SIZE
//!  ┌────────┬──────────────────────────┬─────────┐
//!  │ 0x01020304 │ payload (PAYLOAD_LEN) │ unused  │
//!  └────────┴──────────────────────────┴─────────┘
//! ```
//!
//! A block whose sentinel does not match was never written by this
//! firmware (or is corrupt).  Loading such a block installs the record's
//! defaults and marks it dirty so the defaults are persisted by the next
//! write-back cycle.

pub mod calibration;
pub mod device_name;
pub mod plant_info;
pub mod store;

pub use calibration::{CalibrationValues, EcCalibration, EcPoint, PhPoint};
pub use device_name::DeviceName;
pub use plant_info::PlantInfo;
pub use store::{BootReport, RecordStore};

use heapless::Vec;
use log::{debug, warn};

use crate::app::ports::{BlockStoragePort, StorageError};
use crate::storage::{BLOCK_SIZE, RecordKind};

/// Magic value marking a block as written by this firmware.
pub const WRITE_CHECK: u32 = 0x0102_0304;
/// Byte length of the sentinel prefix.
pub const SENTINEL_LEN: usize = 4;
/// Value of every byte of a freshly erased region.
pub const ERASED_BYTE: u8 = 0xFF;

/// One full region as read back from storage.
pub type Block = [u8; BLOCK_SIZE];

/// Sentinel-prefixed bytes handed to write-back.
pub type PersistedRecord = Vec<u8, BLOCK_SIZE>;

/// `true` when `bytes` starts with the write-check sentinel.
pub fn has_write_check(bytes: &[u8]) -> bool {
    bytes.len() >= SENTINEL_LEN && bytes[..SENTINEL_LEN] == WRITE_CHECK.to_le_bytes()
}

/// Serialisation contract of one persisted record kind.
pub trait Record: Sized {
    const KIND: RecordKind;
    /// Encoded payload size; `SENTINEL_LEN + PAYLOAD_LEN <= BLOCK_SIZE`.
    const PAYLOAD_LEN: usize;

    fn defaults() -> Self;

    /// Write the payload into `out` (exactly `PAYLOAD_LEN` bytes, zeroed).
    fn encode(&self, out: &mut [u8]);

    /// Parse a payload.  `None` means unusable; defaults are installed.
    fn decode(payload: &[u8]) -> Option<Self>;
}

/// Sentinel + payload for `record`.
pub fn encode_record<R: Record>(record: &R) -> PersistedRecord {
    let mut out = PersistedRecord::new();
    // Both fit: PAYLOAD_LEN is bounded by BLOCK_SIZE - SENTINEL_LEN.
    let _ = out.extend_from_slice(&WRITE_CHECK.to_le_bytes());
    let _ = out.resize(SENTINEL_LEN + R::PAYLOAD_LEN, 0);
    record.encode(&mut out[SENTINEL_LEN..]);
    out
}

/// Canonical in-memory copy of one record plus its dirty flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordCell<R> {
    value: R,
    dirty: bool,
}

impl<R: Record> Default for RecordCell<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Record> RecordCell<R> {
    /// Defaults, clean.  Call [`load`](Self::load) before trusting the value.
    pub fn new() -> Self {
        Self {
            value: R::defaults(),
            dirty: false,
        }
    }

    /// Adopt the contents of a block read from storage.
    ///
    /// Returns `true` when the defaults were installed instead.
    pub fn restore(&mut self, block: &Block) -> bool {
        let decoded = if has_write_check(block) {
            R::decode(&block[SENTINEL_LEN..SENTINEL_LEN + R::PAYLOAD_LEN])
        } else {
            None
        };

        match decoded {
            Some(value) => {
                self.value = value;
                debug!("{}: restored from storage", R::KIND);
                false
            }
            None => {
                warn!("{}: no valid record, installing defaults", R::KIND);
                self.value = R::defaults();
                self.dirty = true;
                true
            }
        }
    }

    /// One guarded load of this kind's region, then [`restore`](Self::restore).
    pub fn load(&mut self, storage: &mut impl BlockStoragePort) -> Result<bool, StorageError> {
        let block = storage.load_block(R::KIND)?;
        Ok(self.restore(&block))
    }

    pub fn get(&self) -> &R {
        &self.value
    }

    /// Mutate the value in place and mark it dirty.
    pub fn update(&mut self, mutate: impl FnOnce(&mut R)) {
        mutate(&mut self.value);
        self.dirty = true;
    }

    pub fn replace(&mut self, value: R) {
        self.value = value;
        self.dirty = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Re-arm write-back, e.g. after a failed store.
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Read-and-clear the dirty flag.  The only path that clears it.
    pub fn take_dirty(&mut self) -> Option<PersistedRecord> {
        if !core::mem::take(&mut self.dirty) {
            return None;
        }
        Some(encode_record(&self.value))
    }
}

// ───────────────────────────────────────────────────────────────
// Errors
// ───────────────────────────────────────────────────────────────

/// Rejected record mutations.  Storage is never touched when one is returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordError {
    /// Device name longer than the advertising budget allows.
    NameTooLong { len: usize, max: usize },
    EmptyName,
    /// A fixed-width text field received too many bytes.
    FieldTooLong(&'static str),
    NotUtf8,
}

impl core::fmt::Display for RecordError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NameTooLong { len, max } => {
                write!(f, "device name is {} bytes, limit is {}", len, max)
            }
            Self::EmptyName => write!(f, "device name is empty"),
            Self::FieldTooLong(field) => write!(f, "{} too long", field),
            Self::NotUtf8 => write!(f, "text is not valid UTF-8"),
        }
    }
}

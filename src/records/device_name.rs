//! Advertised device name.
//!
//! Stored as a length byte followed by the name bytes (no terminator).
//! The bound comes from the 31-byte advertising payload: 2 bytes of AD
//! header, 3 bytes of flags and a 16-bit service UUID leave 24 bytes.

use heapless::String;

use super::{ERASED_BYTE, Record, RecordError};
use crate::storage::RecordKind;

pub const DEVNAME_MAX_LEN: usize = 24;
pub const DEFAULT_DEVICE_NAME: &str = "LBL";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceName(String<DEVNAME_MAX_LEN>);

impl Default for DeviceName {
    fn default() -> Self {
        let mut name = String::new();
        let _ = name.push_str(DEFAULT_DEVICE_NAME);
        Self(name)
    }
}

impl DeviceName {
    /// Over-long names are rejected, never truncated.
    pub fn new(name: &str) -> Result<Self, RecordError> {
        if name.is_empty() {
            return Err(RecordError::EmptyName);
        }
        let mut out = String::new();
        out.push_str(name).map_err(|()| RecordError::NameTooLong {
            len: name.len(),
            max: DEVNAME_MAX_LEN,
        })?;
        Ok(Self(out))
    }

    /// Validate raw bytes as received over the air.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, RecordError> {
        if bytes.len() > DEVNAME_MAX_LEN {
            return Err(RecordError::NameTooLong {
                len: bytes.len(),
                max: DEVNAME_MAX_LEN,
            });
        }
        let text = core::str::from_utf8(bytes).map_err(|_| RecordError::NotUtf8)?;
        Self::new(text)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl core::fmt::Display for DeviceName {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl Record for DeviceName {
    const KIND: RecordKind = RecordKind::DeviceName;
    const PAYLOAD_LEN: usize = 1 + DEVNAME_MAX_LEN;

    fn defaults() -> Self {
        Self::default()
    }

    fn encode(&self, out: &mut [u8]) {
        let bytes = self.as_bytes();
        // len <= DEVNAME_MAX_LEN < 256
        out[0] = bytes.len() as u8;
        out[1..1 + bytes.len()].copy_from_slice(bytes);
    }

    fn decode(payload: &[u8]) -> Option<Self> {
        let (&len, rest) = payload.split_first()?;
        if len == ERASED_BYTE {
            return None;
        }
        let len = usize::from(len);
        if len == 0 || len > rest.len() {
            return None;
        }
        Self::from_bytes(&rest[..len]).ok()
    }
}

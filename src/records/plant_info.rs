//! Plant info record: two fixed-width text fields.
//!
//! Set by the client, never interpreted by the device.  Unused bytes of a
//! field are zero; an unset field is filled with `'?'`.

use super::{Record, RecordError};
use crate::storage::RecordKind;

pub const PLANT_TYPE_LEN: usize = 20;
pub const GROWTH_STAGE_LEN: usize = 8;
/// Filler of an unset field.
pub const PLACEHOLDER: u8 = b'?';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlantInfo {
    plant_type: [u8; PLANT_TYPE_LEN],
    growth_stage: [u8; GROWTH_STAGE_LEN],
}

impl Default for PlantInfo {
    fn default() -> Self {
        Self {
            plant_type: [PLACEHOLDER; PLANT_TYPE_LEN],
            growth_stage: [PLACEHOLDER; GROWTH_STAGE_LEN],
        }
    }
}

impl PlantInfo {
    pub fn new(plant_type: &str, growth_stage: &str) -> Result<Self, RecordError> {
        Ok(Self {
            plant_type: fixed_field(plant_type, "plant type")?,
            growth_stage: fixed_field(growth_stage, "growth stage")?,
        })
    }

    /// Text up to the first NUL, or `None` if the stored bytes are not UTF-8.
    pub fn plant_type(&self) -> Option<&str> {
        field_str(&self.plant_type)
    }

    pub fn growth_stage(&self) -> Option<&str> {
        field_str(&self.growth_stage)
    }
}

fn fixed_field<const N: usize>(text: &str, name: &'static str) -> Result<[u8; N], RecordError> {
    let bytes = text.as_bytes();
    if bytes.len() > N {
        return Err(RecordError::FieldTooLong(name));
    }
    let mut out = [0u8; N];
    out[..bytes.len()].copy_from_slice(bytes);
    Ok(out)
}

fn field_str(field: &[u8]) -> Option<&str> {
    let end = field.iter().position(|&b| b == 0).unwrap_or(field.len());
    core::str::from_utf8(&field[..end]).ok()
}

impl Record for PlantInfo {
    const KIND: RecordKind = RecordKind::PlantInfo;
    const PAYLOAD_LEN: usize = PLANT_TYPE_LEN + GROWTH_STAGE_LEN;

    fn defaults() -> Self {
        Self::default()
    }

    fn encode(&self, out: &mut [u8]) {
        out[..PLANT_TYPE_LEN].copy_from_slice(&self.plant_type);
        out[PLANT_TYPE_LEN..Self::PAYLOAD_LEN].copy_from_slice(&self.growth_stage);
    }

    fn decode(payload: &[u8]) -> Option<Self> {
        if payload.len() != Self::PAYLOAD_LEN {
            return None;
        }
        let mut info = Self::default();
        info.plant_type.copy_from_slice(&payload[..PLANT_TYPE_LEN]);
        info.growth_stage
            .copy_from_slice(&payload[PLANT_TYPE_LEN..Self::PAYLOAD_LEN]);
        Some(info)
    }
}

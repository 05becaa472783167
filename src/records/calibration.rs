//! Calibration record.
//!
//! Two pH points (electrode millivolts in the pH 4 and pH 7 buffers) and
//! two conductivity points (user-entered solution value plus the measured
//! rectifier input/output millivolts).  The client fits its own curves;
//! the device only stores the points.
//!
//! Payload layout, little-endian:
//!
//! | offset | field              |
//! |--------|--------------------|
//! | 0      | pH low  mV (i16)   |
//! | 2      | pH high mV (i16)   |
//! | 4      | EC1 solution (u16) |
//! | 6      | EC2 solution (u16) |
//! | 8      | EC1 vin, vout (i16)|
//! | 12     | EC2 vin, vout (i16)|

use super::Record;
use crate::storage::RecordKind;

/// Ideal electrode potential in the pH 4 buffer.
pub const PH_LOW_IDEAL_MV: i16 = 178;
/// Ideal electrode potential in the pH 7 buffer.
pub const PH_HIGH_IDEAL_MV: i16 = 0;

pub const CALIBRATION_PAYLOAD_LEN: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhPoint {
    /// pH 4 reference buffer.
    Low,
    /// pH 7 reference buffer.
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EcPoint {
    First,
    Second,
}

impl EcPoint {
    const fn index(self) -> usize {
        match self {
            Self::First => 0,
            Self::Second => 1,
        }
    }
}

/// One conductivity calibration point.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EcCalibration {
    /// Reference solution value as entered by the user.
    pub solution: u16,
    pub vin_mv: i16,
    pub vout_mv: i16,
}

impl EcCalibration {
    pub const fn mv(&self) -> [i16; 2] {
        [self.vin_mv, self.vout_mv]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalibrationValues {
    ph_low_mv: i16,
    ph_high_mv: i16,
    ec: [EcCalibration; 2],
}

impl Default for CalibrationValues {
    fn default() -> Self {
        Self {
            ph_low_mv: PH_LOW_IDEAL_MV,
            ph_high_mv: PH_HIGH_IDEAL_MV,
            ec: [EcCalibration::default(); 2],
        }
    }
}

impl CalibrationValues {
    pub fn ph(&self, point: PhPoint) -> i16 {
        match point {
            PhPoint::Low => self.ph_low_mv,
            PhPoint::High => self.ph_high_mv,
        }
    }

    pub fn ec(&self, point: EcPoint) -> &EcCalibration {
        &self.ec[point.index()]
    }

    /// Store a pH point.  Also used for undo: the client supplies the
    /// previous value.
    pub fn set_ph(&mut self, point: PhPoint, mv: i16) {
        match point {
            PhPoint::Low => self.ph_low_mv = mv,
            PhPoint::High => self.ph_high_mv = mv,
        }
    }

    pub fn set_ec(&mut self, point: EcPoint, solution: u16, mv: [i16; 2]) {
        self.ec[point.index()] = EcCalibration {
            solution,
            vin_mv: mv[0],
            vout_mv: mv[1],
        };
    }

    /// Restore the measured pair of an EC point.  The solution value is kept.
    pub fn undo_ec(&mut self, point: EcPoint, mv: [i16; 2]) {
        let slot = &mut self.ec[point.index()];
        slot.vin_mv = mv[0];
        slot.vout_mv = mv[1];
    }

    /// pH back to the ideal electrode curve.  EC untouched.
    pub fn reset_ph(&mut self) {
        self.ph_low_mv = PH_LOW_IDEAL_MV;
        self.ph_high_mv = PH_HIGH_IDEAL_MV;
    }

    /// Zero both EC points, solutions included.  pH untouched.
    pub fn reset_ec(&mut self) {
        self.ec = [EcCalibration::default(); 2];
    }

    pub fn to_bytes(&self) -> [u8; CALIBRATION_PAYLOAD_LEN] {
        let mut out = [0u8; CALIBRATION_PAYLOAD_LEN];
        out[0..2].copy_from_slice(&self.ph_low_mv.to_le_bytes());
        out[2..4].copy_from_slice(&self.ph_high_mv.to_le_bytes());
        out[4..6].copy_from_slice(&self.ec[0].solution.to_le_bytes());
        out[6..8].copy_from_slice(&self.ec[1].solution.to_le_bytes());
        for (i, ec) in self.ec.iter().enumerate() {
            let at = 8 + i * 4;
            out[at..at + 2].copy_from_slice(&ec.vin_mv.to_le_bytes());
            out[at + 2..at + 4].copy_from_slice(&ec.vout_mv.to_le_bytes());
        }
        out
    }

    pub fn from_bytes(bytes: &[u8; CALIBRATION_PAYLOAD_LEN]) -> Self {
        let i16_at = |at: usize| i16::from_le_bytes([bytes[at], bytes[at + 1]]);
        let u16_at = |at: usize| u16::from_le_bytes([bytes[at], bytes[at + 1]]);
        Self {
            ph_low_mv: i16_at(0),
            ph_high_mv: i16_at(2),
            ec: [
                EcCalibration {
                    solution: u16_at(4),
                    vin_mv: i16_at(8),
                    vout_mv: i16_at(10),
                },
                EcCalibration {
                    solution: u16_at(6),
                    vin_mv: i16_at(12),
                    vout_mv: i16_at(14),
                },
            ],
        }
    }
}

impl Record for CalibrationValues {
    const KIND: RecordKind = RecordKind::Calibration;
    const PAYLOAD_LEN: usize = CALIBRATION_PAYLOAD_LEN;

    fn defaults() -> Self {
        Self::default()
    }

    fn encode(&self, out: &mut [u8]) {
        out[..CALIBRATION_PAYLOAD_LEN].copy_from_slice(&self.to_bytes());
    }

    fn decode(payload: &[u8]) -> Option<Self> {
        let bytes: &[u8; CALIBRATION_PAYLOAD_LEN] = payload.try_into().ok()?;
        Some(Self::from_bytes(bytes))
    }
}

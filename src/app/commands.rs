//! Inbound commands to the hydro service.
//!
//! The wireless layer writes one control frame per request: an opcode
//! byte followed by a little-endian payload.
//!
//! | op | command            | payload                     |
//! |----|--------------------|-----------------------------|
//! | 0  | reset pH           | –                           |
//! | 1  | reset EC           | –                           |
//! | 2  | calibrate pH 4     | –                           |
//! | 3  | calibrate pH 7     | –                           |
//! | 4  | update measurements| –                           |
//! | 5  | calibrate EC 1     | solution u16                |
//! | 6  | calibrate EC 2     | solution u16                |
//! | 7  | undo pH 4          | mV i16                      |
//! | 8  | undo pH 7          | mV i16                      |
//! | 9  | undo EC 1          | vin i16, vout i16           |
//! | 10 | undo EC 2          | vin i16, vout i16           |
//! | 11 | update battery     | –                           |
//! | 12 | set device name    | name bytes (rest of frame)  |

use crate::records::{DeviceName, EcPoint, PhPoint};

/// Commands that the wireless layer can send into the application core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlCommand {
    ResetPh,
    ResetEc,
    /// Sample the probe and store the reading as a pH point.
    CalibratePh(PhPoint),
    UpdateMeasurements,
    /// Sample the probe and store the reading with the user's solution value.
    CalibrateEc { point: EcPoint, solution: u16 },
    UndoPh { point: PhPoint, mv: i16 },
    UndoEc { point: EcPoint, mv: [i16; 2] },
    UpdateBattery,
    SetDeviceName(DeviceName),
}

impl ControlCommand {
    /// Decode one control frame.
    pub fn decode(frame: &[u8]) -> Result<Self, CommandError> {
        let (&opcode, payload) = frame.split_first().ok_or(CommandError::Empty)?;

        let cmd = match opcode {
            0 => Self::ResetPh,
            1 => Self::ResetEc,
            2 => Self::CalibratePh(PhPoint::Low),
            3 => Self::CalibratePh(PhPoint::High),
            4 => Self::UpdateMeasurements,
            5 | 6 => Self::CalibrateEc {
                point: ec_point(opcode == 5),
                solution: u16::from_le_bytes(take::<2>(opcode, payload)?),
            },
            7 | 8 => Self::UndoPh {
                point: if opcode == 7 { PhPoint::Low } else { PhPoint::High },
                mv: i16::from_le_bytes(take::<2>(opcode, payload)?),
            },
            9 | 10 => {
                let raw = take::<4>(opcode, payload)?;
                Self::UndoEc {
                    point: ec_point(opcode == 9),
                    mv: [
                        i16::from_le_bytes([raw[0], raw[1]]),
                        i16::from_le_bytes([raw[2], raw[3]]),
                    ],
                }
            }
            11 => Self::UpdateBattery,
            12 => Self::SetDeviceName(
                DeviceName::from_bytes(payload).map_err(|_| CommandError::InvalidName)?,
            ),
            other => return Err(CommandError::UnknownOpcode(other)),
        };
        Ok(cmd)
    }

    /// Opcode this command is encoded with.
    pub fn opcode(&self) -> u8 {
        match self {
            Self::ResetPh => 0,
            Self::ResetEc => 1,
            Self::CalibratePh(PhPoint::Low) => 2,
            Self::CalibratePh(PhPoint::High) => 3,
            Self::UpdateMeasurements => 4,
            Self::CalibrateEc { point: EcPoint::First, .. } => 5,
            Self::CalibrateEc { point: EcPoint::Second, .. } => 6,
            Self::UndoPh { point: PhPoint::Low, .. } => 7,
            Self::UndoPh { point: PhPoint::High, .. } => 8,
            Self::UndoEc { point: EcPoint::First, .. } => 9,
            Self::UndoEc { point: EcPoint::Second, .. } => 10,
            Self::UpdateBattery => 11,
            Self::SetDeviceName(_) => 12,
        }
    }
}

fn ec_point(first: bool) -> EcPoint {
    if first { EcPoint::First } else { EcPoint::Second }
}

/// First `N` payload bytes; trailing bytes are ignored.
fn take<const N: usize>(opcode: u8, payload: &[u8]) -> Result<[u8; N], CommandError> {
    payload
        .get(..N)
        .and_then(|b| b.try_into().ok())
        .ok_or(CommandError::Truncated {
            opcode,
            needed: N,
            got: payload.len(),
        })
}

/// Control frames that could not be decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandError {
    Empty,
    UnknownOpcode(u8),
    /// Payload shorter than the opcode requires.
    Truncated { opcode: u8, needed: usize, got: usize },
    /// Device name empty, over-long or not UTF-8.
    InvalidName,
}

impl core::fmt::Display for CommandError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Empty => write!(f, "empty control frame"),
            Self::UnknownOpcode(op) => write!(f, "unknown opcode {}", op),
            Self::Truncated { opcode, needed, got } => write!(
                f,
                "opcode {} needs {} payload bytes, got {}",
                opcode, needed, got
            ),
            Self::InvalidName => write!(f, "invalid device name"),
        }
    }
}

//! Outbound notifications.
//!
//! The [`HydroService`](super::service::HydroService) emits these through
//! the [`NotifySink`](super::ports::NotifySink) port after a command has
//! changed or sampled something the client displays.

use heapless::Vec;

use crate::records::{CalibrationValues, DeviceName};

/// Largest notification payload (the device name).
pub const NOTIFY_MAX_LEN: usize = 24;

/// One probe sample, as shown to the client.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Measurements {
    pub ec_vin_mv: i16,
    pub ec_vout_mv: i16,
    pub ph_mv: i16,
}

impl Measurements {
    /// EC vin, EC vout, pH, then two bytes of padding.
    pub fn to_bytes(&self) -> [u8; 8] {
        let mut out = [0u8; 8];
        out[0..2].copy_from_slice(&self.ec_vin_mv.to_le_bytes());
        out[2..4].copy_from_slice(&self.ec_vout_mv.to_le_bytes());
        out[4..6].copy_from_slice(&self.ph_mv.to_le_bytes());
        out
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    /// Full calibration set after any calibrate / undo / reset.
    Calibration(CalibrationValues),
    Measurements(Measurements),
    /// Battery voltage in millivolts.
    BatteryLevel(u16),
    DeviceName(DeviceName),
}

impl Notification {
    /// Characteristic value the wireless layer should publish.
    pub fn payload(&self) -> Vec<u8, NOTIFY_MAX_LEN> {
        let mut out = Vec::new();
        // All payloads fit NOTIFY_MAX_LEN.
        let _ = match self {
            Self::Calibration(c) => out.extend_from_slice(&c.to_bytes()),
            Self::Measurements(m) => out.extend_from_slice(&m.to_bytes()),
            Self::BatteryLevel(mv) => out.extend_from_slice(&mv.to_le_bytes()),
            Self::DeviceName(name) => out.extend_from_slice(name.as_bytes()),
        };
        out
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Calibration(_) => "calibration",
            Self::Measurements(_) => "measurements",
            Self::BatteryLevel(_) => "battery",
            Self::DeviceName(_) => "device-name",
        }
    }
}

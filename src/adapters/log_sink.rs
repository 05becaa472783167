//! Log-based notification sink adapter.
//!
//! Implements [`NotifySink`] by writing every notification to the
//! ESP-IDF logger (UART / USB-CDC in production).  The GATT server
//! implements the same trait to push the payload to a subscribed client.

use log::info;

use crate::app::events::Notification;
use crate::app::ports::NotifySink;
use crate::records::{EcPoint, PhPoint};

/// Adapter that logs every [`Notification`] to the serial console.
#[derive(Default)]
pub struct LogNotifySink {
    sent: u32,
}

impl LogNotifySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Notifications emitted since boot.
    pub fn sent(&self) -> u32 {
        self.sent
    }
}

impl NotifySink for LogNotifySink {
    fn notify(&mut self, notification: &Notification) {
        self.sent = self.sent.wrapping_add(1);
        match notification {
            Notification::Calibration(c) => {
                let ec1 = c.ec(EcPoint::First);
                let ec2 = c.ec(EcPoint::Second);
                info!(
                    "CAL   | pH4={}mV pH7={}mV | EC1 {}@{}/{}mV | EC2 {}@{}/{}mV",
                    c.ph(PhPoint::Low),
                    c.ph(PhPoint::High),
                    ec1.solution,
                    ec1.vin_mv,
                    ec1.vout_mv,
                    ec2.solution,
                    ec2.vin_mv,
                    ec2.vout_mv,
                );
            }
            Notification::Measurements(m) => {
                info!(
                    "MEAS  | EC vin={}mV vout={}mV | pH={}mV",
                    m.ec_vin_mv, m.ec_vout_mv, m.ph_mv
                );
            }
            Notification::BatteryLevel(mv) => {
                info!("BATT  | {}mV", mv);
            }
            Notification::DeviceName(name) => {
                info!("NAME  | '{}'", name);
            }
        }
    }
}

//! ADC adapter.
//!
//! Implements [`AnalogPort`] for the probe front-end.
//!
//! - **`target_os = "espidf"`** — oneshot ADC1 reads (channels configured
//!   by `hw_init`), converted linearly to millivolts.
//! - **`not(target_os = "espidf")`** — per-channel injected values for
//!   host-side testing.

use crate::app::ports::{AnalogPort, MAX_ANALOG_CHANNEL, SensorError};

#[cfg(target_os = "espidf")]
use crate::drivers::hw_init;

pub struct AdcAdapter {
    #[cfg(not(target_os = "espidf"))]
    sim_mv: [i16; MAX_ANALOG_CHANNEL as usize + 1],
}

impl Default for AdcAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl AdcAdapter {
    pub fn new() -> Self {
        Self {
            #[cfg(not(target_os = "espidf"))]
            sim_mv: [0; MAX_ANALOG_CHANNEL as usize + 1],
        }
    }

    /// Inject the value the next reads of `channel` return.
    #[cfg(not(target_os = "espidf"))]
    pub fn sim_set_mv(&mut self, channel: u8, mv: i16) {
        if let Some(slot) = self.sim_mv.get_mut(usize::from(channel)) {
            *slot = mv;
        }
    }
}

impl AnalogPort for AdcAdapter {
    fn read_mv(&mut self, channel: u8) -> Result<i16, SensorError> {
        if channel > MAX_ANALOG_CHANNEL {
            return Err(SensorError::InvalidChannel(channel));
        }

        #[cfg(target_os = "espidf")]
        {
            hw_init::adc1_read(channel)
                .map(hw_init::raw_to_mv)
                .ok_or(SensorError::AdcReadFailed)
        }

        #[cfg(not(target_os = "espidf"))]
        {
            Ok(self.sim_mv[usize::from(channel)])
        }
    }
}

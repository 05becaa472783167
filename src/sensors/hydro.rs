//! pH / EC probe front-end.
//!
//! Builds probe-level readings from raw analog samples:
//!
//! - **pH**: electrode amplifier output minus its virtual ground.
//! - **EC**: sample the EC virtual ground, then for each side of the cell
//!   pulse its discharge FET to empty the rectifier capacitor and sample
//!   it straight after, relative to that ground.  Input side first.
//! - **Battery**: divider voltage, clamped at zero.

use embedded_hal::digital::OutputPin;
use log::{debug, error};

use crate::app::ports::{AnalogPort, ProbePort, SensorError};
use crate::pins;

pub struct HydroProbe<A, P> {
    adc: A,
    vin_fet: P,
    vout_fet: P,
}

impl<A: AnalogPort, P: OutputPin> HydroProbe<A, P> {
    pub fn new(adc: A, vin_fet: P, vout_fet: P) -> Self {
        Self {
            adc,
            vin_fet,
            vout_fet,
        }
    }

    /// Pulse one discharge FET, then sample its channel.
    fn discharged_read(
        adc: &mut A,
        fet: &mut P,
        channel: u8,
        ground_mv: i16,
    ) -> Result<i16, SensorError> {
        let pulse = fet.set_high().and_then(|()| fet.set_low());
        if pulse.is_err() {
            error!("probe: EC discharge failed on channel {}", channel);
            return Err(SensorError::GpioWriteFailed);
        }
        Ok(adc.read_mv(channel)?.saturating_sub(ground_mv))
    }

    fn relative(&mut self, channel: u8, ground_mv: i16) -> Result<i16, SensorError> {
        Ok(self.adc.read_mv(channel)?.saturating_sub(ground_mv))
    }
}

impl<A: AnalogPort, P: OutputPin> ProbePort for HydroProbe<A, P> {
    fn read_ph_mv(&mut self) -> Result<i16, SensorError> {
        let ground = self.adc.read_mv(pins::PH_VGND_CH)?;
        let mv = self.relative(pins::PH_AIN_CH, ground)?;
        debug!("probe: pH {} mV (vgnd {})", mv, ground);
        Ok(mv)
    }

    fn read_ec_mv(&mut self) -> Result<[i16; 2], SensorError> {
        let ground = self.adc.read_mv(pins::EC_VGND_CH)?;
        let vin = Self::discharged_read(&mut self.adc, &mut self.vin_fet, pins::EC_VIN_CH, ground)?;
        let vout =
            Self::discharged_read(&mut self.adc, &mut self.vout_fet, pins::EC_VOUT_CH, ground)?;
        debug!("probe: EC vin {} vout {} mV (vgnd {})", vin, vout, ground);
        Ok([vin, vout])
    }

    fn read_battery_mv(&mut self) -> Result<u16, SensorError> {
        let mv = self.adc.read_mv(pins::BATTERY_CH)?;
        Ok(mv.max(0) as u16)
    }
}

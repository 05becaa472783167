//! Discharge FET output.
//!
//! Exposes one of the EC front-end discharge FETs as an
//! [`embedded_hal::digital::OutputPin`] so the probe driver stays
//! hardware-agnostic.

use embedded_hal::digital::{ErrorKind, ErrorType, OutputPin};

use super::hw_init;

/// GPIO write rejected by the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GpioError(pub i32);

impl embedded_hal::digital::Error for GpioError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

/// A discharge FET gate on a pre-configured output GPIO.
pub struct DischargeFet {
    gpio: i32,
}

impl DischargeFet {
    /// `gpio` must have been configured by [`hw_init::init_peripherals`].
    pub const fn new(gpio: i32) -> Self {
        Self { gpio }
    }
}

impl ErrorType for DischargeFet {
    type Error = GpioError;
}

impl OutputPin for DischargeFet {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        hw_init::gpio_write(self.gpio, false).map_err(GpioError)
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        hw_init::gpio_write(self.gpio, true).map_err(GpioError)
    }
}

//! Analog channel and GPIO assignments for the Ladybug sensor board.
//!
//! Single source of truth — every driver references this module rather than
//! hard-coding channel or pin numbers.

// ---------------------------------------------------------------------------
// Analog inputs (ADC1 channels)
// ---------------------------------------------------------------------------

/// Battery voltage through the on-board divider.
pub const BATTERY_CH: u8 = 2;

/// Virtual ground of the EC rectifier front-end.
pub const EC_VGND_CH: u8 = 3;
/// EC rectifier input side.
pub const EC_VIN_CH: u8 = 4;
/// EC rectifier output side.
pub const EC_VOUT_CH: u8 = 5;

/// Virtual ground of the pH amplifier.
pub const PH_VGND_CH: u8 = 6;
/// pH electrode amplifier output.
pub const PH_AIN_CH: u8 = 7;

/// Every channel configured at boot.
pub const ANALOG_CHANNELS: [u8; 6] = [
    BATTERY_CH,
    EC_VGND_CH,
    EC_VIN_CH,
    EC_VOUT_CH,
    PH_VGND_CH,
    PH_AIN_CH,
];

// ---------------------------------------------------------------------------
// Digital outputs
// ---------------------------------------------------------------------------

/// FET that discharges the EC input-side rectifier capacitor.
pub const EC_VIN_FET_GPIO: i32 = 10;
/// FET that discharges the EC output-side rectifier capacitor.
pub const EC_VOUT_FET_GPIO: i32 = 11;

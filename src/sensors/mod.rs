//! Sensor subsystem.
//!
//! [`HydroProbe`] turns raw analog samples into the pH, EC and battery
//! readings the application core asks for through
//! [`ProbePort`](crate::app::ports::ProbePort).

pub mod hydro;

pub use hydro::HydroProbe;

//! Application core — pure domain logic, zero I/O.
//!
//! Command decoding, calibration bookkeeping and the write-back contract.
//! All interaction with hardware happens through **port traits** defined
//! in [`ports`], keeping this layer fully testable without real peripherals.

pub mod commands;
pub mod events;
pub mod link;
pub mod ports;
pub mod service;

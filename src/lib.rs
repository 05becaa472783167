//! Ladybug pH/EC sensor firmware library.
//!
//! Exposes the pure-logic modules for integration testing and external
//! inspection. All ESP-IDF-specific code is guarded by
//! `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod app;
pub mod config;
pub mod error;
pub mod pins;
pub mod records;
pub mod storage;

// The ESP-IDF-only halves of these are guarded by cfg attributes inside;
// on the host they compile to simulation backends.
pub mod adapters;
pub mod drivers;
pub mod sensors;

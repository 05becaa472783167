//! Hardware initialisation, the discharge FET outputs and the task watchdog.

pub mod fet;
pub mod hw_init;
pub mod watchdog;

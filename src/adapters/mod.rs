//! Adapters — concrete implementations of the hexagonal port traits.
//!
//! | Adapter    | Implements       | Connects to                 |
//! |------------|------------------|-----------------------------|
//! | `adc`      | AnalogPort       | ESP32 ADC1 oneshot          |
//! | `flash`    | StorageService   | `ladybug` flash partition   |
//! | `log_sink` | NotifySink       | Serial log output           |
//! | `time`     | MonotonicClock   | ESP32 high-resolution timer |

pub mod adc;
pub mod flash;
pub mod log_sink;
pub mod time;

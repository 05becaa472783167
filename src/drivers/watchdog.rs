//! Task watchdog (TWDT) for the main loop.
//!
//! The window must outlast the longest stall the loop can legitimately
//! take: a write-back of every record, each clear and store running to
//! the storage timeout, plus one loop sleep.
//! [`FirmwareConfig::validate`] enforces that, so this driver only
//! subscribes and feeds.
//!
//! On the host the watchdog only counts feeds.
//!
//! [`FirmwareConfig::validate`]: crate::config::FirmwareConfig::validate

#[cfg(target_os = "espidf")]
use esp_idf_sys::*;

use log::info;

use crate::config::FirmwareConfig;

pub struct Watchdog {
    timeout_ms: u32,
    #[cfg(target_os = "espidf")]
    subscribed: bool,
    #[cfg(not(target_os = "espidf"))]
    feeds: core::cell::Cell<u32>,
}

impl Watchdog {
    /// Subscribe the calling task with the configured window.
    pub fn new(config: &FirmwareConfig) -> Self {
        let timeout_ms = config.watchdog_timeout_ms;
        info!(
            "Watchdog: {}ms window (worst-case stall {}ms)",
            timeout_ms,
            config.worst_case_stall_ms()
        );
        Self::subscribe(timeout_ms)
    }

    pub fn timeout_ms(&self) -> u32 {
        self.timeout_ms
    }

    #[cfg(target_os = "espidf")]
    fn subscribe(timeout_ms: u32) -> Self {
        let cfg = esp_task_wdt_config_t {
            timeout_ms,
            idle_core_mask: 0,
            trigger_panic: true,
        };
        // SAFETY: plain FFI calls on the current task, made once at boot.
        let subscribed = unsafe {
            let ret = esp_task_wdt_reconfigure(&cfg);
            if ret != ESP_OK {
                log::warn!("Watchdog: reconfigure returned {}", ret);
            }
            let ret = esp_task_wdt_add(core::ptr::null_mut());
            if ret != ESP_OK {
                log::warn!("Watchdog: subscribe failed ({}), running unguarded", ret);
            }
            ret == ESP_OK
        };
        Self {
            timeout_ms,
            subscribed,
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn subscribe(timeout_ms: u32) -> Self {
        Self {
            timeout_ms,
            feeds: core::cell::Cell::new(0),
        }
    }

    /// Feed once per loop iteration.
    #[cfg(target_os = "espidf")]
    pub fn feed(&self) {
        if self.subscribed {
            // SAFETY: the task was added in subscribe().
            unsafe {
                esp_task_wdt_reset();
            }
        }
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn feed(&self) {
        self.feeds.set(self.feeds.get().saturating_add(1));
    }

    /// Feeds seen so far (host only).
    #[cfg(not(target_os = "espidf"))]
    pub fn feeds(&self) -> u32 {
        self.feeds.get()
    }
}

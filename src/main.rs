//! Ladybug Firmware — Main Entry Point
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  AdcAdapter + DischargeFet   FlashAdapter    SystemClock       │
//! │  (HydroProbe: ProbePort)     (StorageService) (MonotonicClock) │
//! │  LogNotifySink               CONTROL_FRAMES (wireless → loop)  │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │   HydroService (RecordStore)  ·  GuardedStorage         │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use anyhow::Result;
use esp_idf_hal::delay::FreeRtos;
use log::{error, info, warn};

use ladybug::adapters::adc::AdcAdapter;
use ladybug::adapters::flash::FlashAdapter;
use ladybug::adapters::log_sink::LogNotifySink;
use ladybug::adapters::time::SystemClock;
use ladybug::app::link::{self, CONTROL_FRAMES};
use ladybug::app::service::HydroService;
use ladybug::config::FirmwareConfig;
use ladybug::drivers::fet::DischargeFet;
use ladybug::drivers::hw_init;
use ladybug::drivers::watchdog::Watchdog;
use ladybug::error::Error;
use ladybug::pins;
use ladybug::sensors::HydroProbe;
use ladybug::storage::GuardedStorage;

// ── Main ──────────────────────────────────────────────────────

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  Ladybug v{}                         ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    let config = FirmwareConfig::default();
    config.validate().map_err(Error::from)?;

    // ── 2. Peripherals ────────────────────────────────────────
    if let Err(e) = hw_init::init_peripherals() {
        error!("HAL init failed: {} — halting", e);
        halt();
    }

    // ── 3. Persistence (no degraded mode without it) ──────────
    let flash = match FlashAdapter::new() {
        Ok(f) => f,
        Err(code) => {
            error!("Flash partition unavailable ({}) — halting", code);
            halt();
        }
    };
    let mut storage = match GuardedStorage::new(flash, SystemClock::new(), config.storage_timeout()) {
        Ok(s) => s,
        Err(e) => {
            error!("Storage registration failed: {} — halting", e);
            halt();
        }
    };

    // Subscribed only once persistence is up, so a halt above stays halted.
    let watchdog = Watchdog::new(&config);

    // ── 4. Boot load ──────────────────────────────────────────
    let mut app = HydroService::new(&config);
    if let Err(e) = app.boot(&mut storage) {
        error!("Boot load failed: {} — restarting", e);
        restart();
    }

    let mut probe = HydroProbe::new(
        AdcAdapter::new(),
        DischargeFet::new(pins::EC_VIN_FET_GPIO),
        DischargeFet::new(pins::EC_VOUT_FET_GPIO),
    );
    let mut sink = LogNotifySink::new();
    let clock = SystemClock::new();
    let mut last_flush_ms = clock.uptime_ms();

    info!("System ready. Entering main loop.");

    // ── 5. Main loop ──────────────────────────────────────────
    loop {
        while let Some(frame) = link::next_frame(&CONTROL_FRAMES) {
            if let Err(e) = app.handle_frame(&frame, &mut probe, &mut sink) {
                warn!("Control frame rejected: {}", e);
            }
        }

        let now_ms = clock.uptime_ms();
        if now_ms.saturating_sub(last_flush_ms) >= u64::from(config.writeback_interval_ms) {
            last_flush_ms = now_ms;
            if let Err(e) = app.flush_dirty(&mut storage) {
                warn!("Write-back deferred: {}", e);
                if app.restart_required() {
                    error!(
                        "{} consecutive write-back failures — restarting",
                        app.storage_failures()
                    );
                    restart();
                }
            }
        }

        watchdog.feed();
        FreeRtos::delay_ms(config.loop_interval_ms);
    }
}

/// Park forever; only an external reset recovers.
fn halt() -> ! {
    loop {
        FreeRtos::delay_ms(1_000);
    }
}

fn restart() -> ! {
    // SAFETY: esp_restart never returns and is safe to call from task context.
    unsafe { esp_idf_sys::esp_restart() }
}

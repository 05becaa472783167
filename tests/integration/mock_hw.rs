//! Mock hardware adapters for integration tests.
//!
//! Scripted probe readings, a recording notification sink and a
//! deterministic clock, plus helpers that build a [`GuardedStorage`] on
//! top of the simulated flash service.

use std::cell::Cell;
use std::collections::VecDeque;
use std::time::Duration;

use ladybug::adapters::flash::FlashAdapter;
use ladybug::adapters::time::SystemClock;
use ladybug::app::events::Notification;
use ladybug::app::ports::{MonotonicClock, NotifySink, ProbePort, SensorError};
use ladybug::storage::GuardedStorage;

// ── SteppingClock ─────────────────────────────────────────────

/// Advances by a fixed step every time it is read, so a stalled
/// operation times out after a predictable number of polls.
pub struct SteppingClock {
    now_us: Cell<u64>,
    step_us: u64,
}

#[allow(dead_code)]
impl SteppingClock {
    pub fn new(step_us: u64) -> Self {
        Self {
            now_us: Cell::new(0),
            step_us,
        }
    }

    pub fn elapsed_us(&self) -> u64 {
        self.now_us.get()
    }
}

impl MonotonicClock for SteppingClock {
    fn now_us(&self) -> u64 {
        let now = self.now_us.get();
        self.now_us.set(now + self.step_us);
        now
    }
}

impl MonotonicClock for &SteppingClock {
    fn now_us(&self) -> u64 {
        (*self).now_us()
    }
}

// ── Storage fixtures ─────────────────────────────────────────

/// Storage timeout used by the stepping-clock fixtures.
pub const TEST_TIMEOUT: Duration = Duration::from_millis(5);

#[allow(dead_code)]
pub fn sim_storage() -> GuardedStorage<FlashAdapter, SteppingClock> {
    sim_storage_on(FlashAdapter::new().unwrap())
}

#[allow(dead_code)]
pub fn sim_storage_on(flash: FlashAdapter) -> GuardedStorage<FlashAdapter, SteppingClock> {
    GuardedStorage::new(flash, SteppingClock::new(100), TEST_TIMEOUT).unwrap()
}

/// Wall-clock storage for tests where completions arrive from another thread.
#[allow(dead_code)]
pub fn threaded_storage(timeout: Duration) -> GuardedStorage<FlashAdapter, SystemClock> {
    GuardedStorage::new(FlashAdapter::new().unwrap(), SystemClock::new(), timeout).unwrap()
}

/// Simulated power cycle: same flash contents, fresh registration.
#[allow(dead_code)]
pub fn reboot(
    storage: GuardedStorage<FlashAdapter, SteppingClock>,
) -> GuardedStorage<FlashAdapter, SteppingClock> {
    sim_storage_on(storage.into_service())
}

// ── ScriptedProbe ────────────────────────────────────────────

#[derive(Default)]
pub struct ScriptedProbe {
    pub ph: VecDeque<i16>,
    pub ec: VecDeque<[i16; 2]>,
    pub battery_mv: u16,
    pub fail: bool,
}

#[allow(dead_code)]
impl ScriptedProbe {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ph(mut self, mv: i16) -> Self {
        self.ph.push_back(mv);
        self
    }

    pub fn with_ec(mut self, vin: i16, vout: i16) -> Self {
        self.ec.push_back([vin, vout]);
        self
    }
}

impl ProbePort for ScriptedProbe {
    fn read_ph_mv(&mut self) -> Result<i16, SensorError> {
        if self.fail {
            return Err(SensorError::AdcReadFailed);
        }
        self.ph.pop_front().ok_or(SensorError::AdcReadFailed)
    }

    fn read_ec_mv(&mut self) -> Result<[i16; 2], SensorError> {
        if self.fail {
            return Err(SensorError::AdcReadFailed);
        }
        self.ec.pop_front().ok_or(SensorError::AdcReadFailed)
    }

    fn read_battery_mv(&mut self) -> Result<u16, SensorError> {
        if self.fail {
            return Err(SensorError::AdcReadFailed);
        }
        Ok(self.battery_mv)
    }
}

// ── RecordingSink ────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub sent: Vec<Notification>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last(&self) -> Option<&Notification> {
        self.sent.last()
    }
}

impl NotifySink for RecordingSink {
    fn notify(&mut self, notification: &Notification) {
        self.sent.push(notification.clone());
    }
}

//! Application service — the hexagonal core.
//!
//! [`HydroService`] owns the [`RecordStore`] and the write-back failure
//! budget.  Probe reads, notifications and persistence all flow through
//! port traits injected at call sites, so the service is testable with
//! mock adapters.
//!
//! ```text
//!  ProbePort ──▶ ┌────────────────────────┐ ──▶ NotifySink
//!                │      HydroService       │
//!                │  RecordStore · dirty    │ ──▶ BlockStoragePort
//!                └────────────────────────┘
//! ```

use log::{info, warn};

use crate::config::FirmwareConfig;
use crate::error;
use crate::records::{BootReport, RecordError, RecordStore};
use crate::storage::RecordKind;

use super::commands::ControlCommand;
use super::events::{Measurements, Notification};
use super::ports::{BlockStoragePort, NotifySink, ProbePort, StorageError};

// ───────────────────────────────────────────────────────────────
// HydroService
// ───────────────────────────────────────────────────────────────

pub struct HydroService {
    records: RecordStore,
    /// Consecutive write-back cycles that ended in a storage error.
    storage_failures: u8,
    max_storage_failures: u8,
}

impl HydroService {
    /// Records start at their defaults; call [`boot`](Self::boot) next.
    pub fn new(config: &FirmwareConfig) -> Self {
        Self {
            records: RecordStore::new(),
            storage_failures: 0,
            max_storage_failures: config.max_storage_failures,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Load every record from storage.  Kinds that were never written are
    /// defaulted and left dirty for the first write-back.
    pub fn boot(&mut self, storage: &mut impl BlockStoragePort) -> Result<BootReport, StorageError> {
        let report = self.records.load_all(storage)?;
        info!(
            "HydroService booted as '{}'{}",
            self.records.device_name(),
            if report.any_defaulted() {
                " (defaults pending write-back)"
            } else {
                ""
            }
        );
        Ok(report)
    }

    // ── Command handling ──────────────────────────────────────

    /// Decode and apply one raw control frame.
    pub fn handle_frame(
        &mut self,
        frame: &[u8],
        probe: &mut impl ProbePort,
        sink: &mut impl NotifySink,
    ) -> error::Result<()> {
        let cmd = ControlCommand::decode(frame)?;
        self.handle_command(cmd, probe, sink)
    }

    /// Apply a command.  In-memory only: storage is touched by
    /// [`flush_dirty`](Self::flush_dirty).
    pub fn handle_command(
        &mut self,
        cmd: ControlCommand,
        probe: &mut impl ProbePort,
        sink: &mut impl NotifySink,
    ) -> error::Result<()> {
        info!("Command: {:?}", cmd);
        match cmd {
            ControlCommand::ResetPh => {
                self.records.reset_ph();
                self.notify_calibration(sink);
            }
            ControlCommand::ResetEc => {
                self.records.reset_ec();
                self.notify_calibration(sink);
            }
            ControlCommand::CalibratePh(point) => {
                let mv = probe.read_ph_mv()?;
                self.records.set_ph_point(point, mv);
                self.notify_calibration(sink);
            }
            ControlCommand::CalibrateEc { point, solution } => {
                let mv = probe.read_ec_mv()?;
                self.records.set_ec_point(point, solution, mv);
                self.notify_calibration(sink);
            }
            ControlCommand::UndoPh { point, mv } => {
                self.records.undo_ph_point(point, mv);
                self.notify_calibration(sink);
            }
            ControlCommand::UndoEc { point, mv } => {
                self.records.undo_ec_point(point, mv);
                self.notify_calibration(sink);
            }
            ControlCommand::UpdateMeasurements => {
                let [ec_vin_mv, ec_vout_mv] = probe.read_ec_mv()?;
                let ph_mv = probe.read_ph_mv()?;
                sink.notify(&Notification::Measurements(Measurements {
                    ec_vin_mv,
                    ec_vout_mv,
                    ph_mv,
                }));
            }
            ControlCommand::UpdateBattery => {
                let mv = probe.read_battery_mv()?;
                sink.notify(&Notification::BatteryLevel(mv));
            }
            ControlCommand::SetDeviceName(name) => {
                self.records.set_device_name(name.as_str())?;
                sink.notify(&Notification::DeviceName(name));
            }
        }
        Ok(())
    }

    /// Plant metadata arrives on its own characteristic, not as a control frame.
    pub fn set_plant_info(&mut self, plant_type: &str, growth_stage: &str) -> Result<(), RecordError> {
        self.records.set_plant_info(plant_type, growth_stage)?;
        info!("Plant info set to '{}' / '{}'", plant_type, growth_stage);
        Ok(())
    }

    fn notify_calibration(&self, sink: &mut impl NotifySink) {
        sink.notify(&Notification::Calibration(*self.records.calibration()));
    }

    // ── Write-back ────────────────────────────────────────────

    /// Persist every dirty record in poll order.
    ///
    /// On a storage error the failing record is re-marked dirty, the cycle
    /// stops, and the failure counter is bumped.  Returns how many records
    /// were written.
    pub fn flush_dirty(&mut self, storage: &mut impl BlockStoragePort) -> Result<usize, StorageError> {
        let mut written = 0;
        for kind in RecordKind::ALL {
            let Some(bytes) = self.records.poll(kind) else {
                continue;
            };
            if let Err(e) = storage.clear_then_store(kind, &bytes) {
                self.records.mark_dirty(kind);
                self.storage_failures = self.storage_failures.saturating_add(1);
                warn!(
                    "Write-back of {} failed: {} ({}/{})",
                    kind, e, self.storage_failures, self.max_storage_failures
                );
                return Err(e);
            }
            written += 1;
        }
        if written > 0 {
            info!("Write-back: {} record(s) persisted", written);
        }
        self.storage_failures = 0;
        Ok(written)
    }

    /// `true` once the consecutive failure budget is spent; the main loop
    /// should perform a controlled restart.
    pub fn restart_required(&self) -> bool {
        self.storage_failures >= self.max_storage_failures
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn records(&self) -> &RecordStore {
        &self.records
    }

    pub fn storage_failures(&self) -> u8 {
        self.storage_failures
    }

    /// Any record waiting for write-back.
    pub fn has_dirty(&self) -> bool {
        RecordKind::ALL.into_iter().any(|k| self.records.is_dirty(k))
    }
}

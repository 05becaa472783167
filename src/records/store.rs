//! The record store: sole owner of every canonical record and dirty flag.
//!
//! Mutators are synchronous and in-memory only.  Persistence happens when
//! the main loop polls a dirty kind and hands the bytes to
//! [`BlockStoragePort::clear_then_store`].

use log::info;

use super::{
    CalibrationValues, DeviceName, EcPoint, PersistedRecord, PhPoint, PlantInfo, RecordCell,
    RecordError,
};
use crate::app::ports::{BlockStoragePort, StorageError};
use crate::storage::{REGION_COUNT, RecordKind};

/// Which kinds fell back to defaults during boot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BootReport {
    defaulted: [bool; REGION_COUNT],
}

impl BootReport {
    pub fn defaulted(&self, kind: RecordKind) -> bool {
        self.defaulted[kind.index()]
    }

    pub fn any_defaulted(&self) -> bool {
        self.defaulted.iter().any(|&d| d)
    }
}

#[derive(Debug, Clone, Default)]
pub struct RecordStore {
    calibration: RecordCell<CalibrationValues>,
    plant_info: RecordCell<PlantInfo>,
    device_name: RecordCell<DeviceName>,
}

impl RecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Boot ──────────────────────────────────────────────────

    /// Load one kind.  `Ok(true)` means defaults were installed.
    pub fn load(
        &mut self,
        kind: RecordKind,
        storage: &mut impl BlockStoragePort,
    ) -> Result<bool, StorageError> {
        match kind {
            RecordKind::Calibration => self.calibration.load(storage),
            RecordKind::PlantInfo => self.plant_info.load(storage),
            RecordKind::DeviceName => self.device_name.load(storage),
        }
    }

    /// Load every kind in poll order; stops at the first storage error.
    pub fn load_all(
        &mut self,
        storage: &mut impl BlockStoragePort,
    ) -> Result<BootReport, StorageError> {
        let mut report = BootReport::default();
        for kind in RecordKind::ALL {
            report.defaulted[kind.index()] = self.load(kind, storage)?;
        }
        info!(
            "RecordStore: loaded (defaults: cal={} plant={} name={})",
            report.defaulted[0], report.defaulted[1], report.defaulted[2]
        );
        Ok(report)
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn calibration(&self) -> &CalibrationValues {
        self.calibration.get()
    }

    pub fn plant_info(&self) -> &PlantInfo {
        self.plant_info.get()
    }

    pub fn device_name(&self) -> &DeviceName {
        self.device_name.get()
    }

    // ── Calibration mutators ──────────────────────────────────

    pub fn set_ph_point(&mut self, point: PhPoint, mv: i16) {
        self.calibration.update(|c| c.set_ph(point, mv));
    }

    pub fn set_ec_point(&mut self, point: EcPoint, solution: u16, mv: [i16; 2]) {
        self.calibration.update(|c| c.set_ec(point, solution, mv));
    }

    /// Client-side undo: the caller supplies the value to go back to.
    pub fn undo_ph_point(&mut self, point: PhPoint, mv: i16) {
        self.calibration.update(|c| c.set_ph(point, mv));
    }

    pub fn undo_ec_point(&mut self, point: EcPoint, mv: [i16; 2]) {
        self.calibration.update(|c| c.undo_ec(point, mv));
    }

    pub fn reset_ph(&mut self) {
        self.calibration.update(CalibrationValues::reset_ph);
    }

    pub fn reset_ec(&mut self) {
        self.calibration.update(CalibrationValues::reset_ec);
    }

    // ── Text mutators ─────────────────────────────────────────

    /// Rejected input leaves the record (and its dirty flag) untouched.
    pub fn set_plant_info(&mut self, plant_type: &str, growth_stage: &str) -> Result<(), RecordError> {
        let info = PlantInfo::new(plant_type, growth_stage)?;
        self.plant_info.replace(info);
        Ok(())
    }

    pub fn set_device_name(&mut self, name: &str) -> Result<(), RecordError> {
        let name = DeviceName::new(name)?;
        self.device_name.replace(name);
        Ok(())
    }

    pub fn set_device_name_bytes(&mut self, raw: &[u8]) -> Result<(), RecordError> {
        let name = DeviceName::from_bytes(raw)?;
        self.device_name.replace(name);
        Ok(())
    }

    // ── Write-back contract ───────────────────────────────────

    pub fn is_dirty(&self, kind: RecordKind) -> bool {
        match kind {
            RecordKind::Calibration => self.calibration.is_dirty(),
            RecordKind::PlantInfo => self.plant_info.is_dirty(),
            RecordKind::DeviceName => self.device_name.is_dirty(),
        }
    }

    pub fn mark_dirty(&mut self, kind: RecordKind) {
        match kind {
            RecordKind::Calibration => self.calibration.mark_dirty(),
            RecordKind::PlantInfo => self.plant_info.mark_dirty(),
            RecordKind::DeviceName => self.device_name.mark_dirty(),
        }
    }

    /// Read-and-clear `kind`'s dirty flag, returning the sentinel-prefixed
    /// bytes to persist if it was set.
    pub fn poll(&mut self, kind: RecordKind) -> Option<PersistedRecord> {
        match kind {
            RecordKind::Calibration => self.calibration.take_dirty(),
            RecordKind::PlantInfo => self.plant_info.take_dirty(),
            RecordKind::DeviceName => self.device_name.take_dirty(),
        }
    }
}

//! Storage region registry.
//!
//! Resolves one region handle per [`RecordKind`] exactly once, at start-up.
//! Handles are never reassigned afterwards.

use log::{error, info};

use super::service::{CompletionNotifier, Region, StorageService};
use super::{BLOCK_SIZE, REGION_COUNT, RecordKind};
use crate::app::ports::StorageError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegionRegistry {
    regions: [Region; REGION_COUNT],
}

impl RegionRegistry {
    /// Reserve the regions and install the completion upcall.
    ///
    /// Failure here is fatal for persistence: there is no degraded mode.
    pub fn initialize(
        service: &mut impl StorageService,
        notifier: CompletionNotifier,
    ) -> Result<Self, StorageError> {
        let block = service
            .register(BLOCK_SIZE, REGION_COUNT, notifier)
            .map_err(|code| {
                error!("RegionRegistry: register failed ({})", code);
                StorageError::Registration(code)
            })?;

        if block.count() < REGION_COUNT {
            error!(
                "RegionRegistry: service granted {} of {} regions",
                block.count(),
                REGION_COUNT
            );
            return Err(StorageError::InvalidInput("too few regions granted"));
        }

        let mut regions = [Region::new(0); REGION_COUNT];
        for kind in RecordKind::ALL {
            regions[kind.index()] = block
                .region(kind.index())
                .ok_or(StorageError::InvalidInput("region index out of range"))?;
        }

        info!(
            "RegionRegistry: calibration@{:#x} plant-info@{:#x} device-name@{:#x}",
            regions[0].raw(),
            regions[1].raw(),
            regions[2].raw()
        );
        Ok(Self { regions })
    }

    /// Region backing `kind`.
    pub fn region(&self, kind: RecordKind) -> Region {
        self.regions[kind.index()]
    }

    /// Reverse lookup, used to name the record a stray completion belongs to.
    pub fn kind_of(&self, region: Region) -> Option<RecordKind> {
        RecordKind::ALL
            .into_iter()
            .find(|kind| self.regions[kind.index()] == region)
    }
}

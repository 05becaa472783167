//! Guarded storage operation.
//!
//! Wraps every request to the asynchronous [`StorageService`] with:
//!
//! 1. single-outstanding-operation discipline (`&mut self` + in-flight marker),
//! 2. an operation watchdog armed before submission and disarmed on completion,
//! 3. a cooperative poll loop that turns the completion upcall into a
//!    synchronous `Result`.
//!
//! ```text
//!   arm ──▶ submit ──▶ ┌ poll completion ┐ ──▶ disarm ──▶ Ok / Service
//!                      └ poll watchdog ──┘ ──▶ disarm ──▶ TimedOut
//! ```
//!
//! A timed-out request is abandoned, not retried.  If its completion shows
//! up later it is discarded when the next operation starts, or skipped
//! because its region/op do not match what that operation awaits.
//!
//! Completions carry no request id, so a late completion for the *same*
//! region and op as the awaited request cannot be told apart from it and
//! is accepted in its place.  Only a service that delivers completions
//! from another context can produce one; the flash backend on the device
//! completes inline before `submit` returns.

use core::time::Duration;
use std::sync::Arc;

use log::{debug, error, warn};

use super::service::{
    Completion, CompletionNotifier, CompletionSignal, OpCode, Region, StorageService,
};
use super::{BLOCK_SIZE, RecordKind, RegionRegistry};
use crate::app::ports::{BlockStoragePort, MonotonicClock, ServiceCode, StorageError};
use crate::records::Block;
use crate::records::ERASED_BYTE;

/// Request shape accepted by [`GuardedStorage::perform`].
#[derive(Debug)]
pub enum StorageOp<'a> {
    /// Fill the buffer from the start of the region.
    Load(&'a mut [u8]),
    /// Clear the region, then write the bytes at offset 0.
    ClearThenStore(&'a [u8]),
}

/// Deadline for the single outstanding request.
#[derive(Debug)]
struct OpWatchdog {
    timeout_us: u64,
    armed_at: Option<u64>,
}

impl OpWatchdog {
    fn new(timeout: Duration) -> Self {
        Self {
            timeout_us: u64::try_from(timeout.as_micros()).unwrap_or(u64::MAX),
            armed_at: None,
        }
    }

    fn arm(&mut self, now_us: u64) {
        self.armed_at = Some(now_us);
    }

    fn disarm(&mut self) {
        self.armed_at = None;
    }

    fn expired(&self, now_us: u64) -> bool {
        match self.armed_at {
            Some(start) => now_us.saturating_sub(start) >= self.timeout_us,
            None => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct InFlight {
    region: Region,
    op: OpCode,
}

/// Bounded, blocking access to the registered regions.
pub struct GuardedStorage<S, C> {
    service: S,
    clock: C,
    regions: RegionRegistry,
    completion: Arc<CompletionSignal>,
    watchdog: OpWatchdog,
    in_flight: Option<InFlight>,
}

impl<S: StorageService, C: MonotonicClock> GuardedStorage<S, C> {
    /// Register the regions with `service` and install the completion
    /// upcall.  The only place registration happens.
    pub fn new(mut service: S, clock: C, timeout: Duration) -> Result<Self, StorageError> {
        let completion = Arc::new(CompletionSignal::new());
        let notifier = CompletionNotifier::new(completion.clone());
        let regions = RegionRegistry::initialize(&mut service, notifier)?;
        Ok(Self {
            service,
            clock,
            regions,
            completion,
            watchdog: OpWatchdog::new(timeout),
            in_flight: None,
        })
    }

    pub fn regions(&self) -> &RegionRegistry {
        &self.regions
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    pub fn service_mut(&mut self) -> &mut S {
        &mut self.service
    }

    /// Release the service, e.g. to register it again after a restart.
    pub fn into_service(self) -> S {
        self.service
    }

    /// `true` when no request is outstanding.
    pub fn is_idle(&self) -> bool {
        self.in_flight.is_none()
    }

    /// Run one guarded operation against the region backing `kind`.
    pub fn perform(&mut self, kind: RecordKind, op: StorageOp<'_>) -> Result<(), StorageError> {
        let region = self.regions.region(kind);
        match op {
            StorageOp::Load(buf) => {
                check_len(buf.len())?;
                let size = buf.len();
                let done = self.guarded(region, OpCode::Load, |svc| svc.load(region, size, 0))?;
                if done.data.len() < size {
                    error!(
                        "GuardedStorage: short read on {} ({} of {} bytes)",
                        kind,
                        done.data.len(),
                        size
                    );
                    return Err(StorageError::Service(ServiceCode::SHORT_READ));
                }
                buf.copy_from_slice(&done.data[..size]);
                debug!("GuardedStorage: loaded {} bytes of {}", size, kind);
                Ok(())
            }
            StorageOp::ClearThenStore(bytes) => {
                check_len(bytes.len())?;
                // Never combined, never reordered: the medium cannot be
                // rewritten in place.
                self.guarded(region, OpCode::Clear, |svc| svc.clear(region, BLOCK_SIZE))?;
                self.guarded(region, OpCode::Store, |svc| svc.store(region, bytes, 0))?;
                debug!("GuardedStorage: stored {} bytes to {}", bytes.len(), kind);
                Ok(())
            }
        }
    }

    /// Arm, submit, wait, disarm.
    fn guarded(
        &mut self,
        region: Region,
        op: OpCode,
        submit: impl FnOnce(&mut S) -> Result<(), ServiceCode>,
    ) -> Result<Completion, StorageError> {
        // Whatever sits in the mailbox belongs to an abandoned request.
        if self.completion.try_take().is_some() {
            warn!("GuardedStorage: dropped late completion before {:?}", op);
        }

        self.in_flight = Some(InFlight { region, op });
        self.watchdog.arm(self.clock.now_us());

        let outcome = match submit(&mut self.service) {
            Ok(()) => self.wait_for(region, op),
            Err(code) => {
                error!("GuardedStorage: {:?} rejected on submit ({})", op, code);
                Err(StorageError::Service(code))
            }
        };

        self.watchdog.disarm();
        self.in_flight = None;

        let completion = outcome?;
        if !completion.status.is_success() {
            error!(
                "GuardedStorage: {:?} on {:#x} completed with {}",
                op,
                region.raw(),
                completion.status
            );
            return Err(StorageError::Service(completion.status));
        }
        Ok(completion)
    }

    fn wait_for(&self, region: Region, op: OpCode) -> Result<Completion, StorageError> {
        loop {
            if let Some(done) = self.completion.try_take() {
                if done.region == region && done.op == op {
                    return Ok(done);
                }
                match self.regions.kind_of(done.region) {
                    Some(kind) => warn!(
                        "GuardedStorage: skipping stale {:?} completion for {}",
                        done.op, kind
                    ),
                    None => warn!(
                        "GuardedStorage: skipping {:?} completion for unknown region {:#x}",
                        done.op,
                        done.region.raw()
                    ),
                }
                continue;
            }
            if self.watchdog.expired(self.clock.now_us()) {
                error!(
                    "GuardedStorage: {:?} on {:#x} timed out",
                    op,
                    region.raw()
                );
                return Err(StorageError::TimedOut);
            }
            core::hint::spin_loop();
        }
    }
}

fn check_len(len: usize) -> Result<(), StorageError> {
    if len == 0 {
        return Err(StorageError::InvalidInput("zero-length transfer"));
    }
    if len > BLOCK_SIZE {
        return Err(StorageError::InvalidInput("transfer larger than block"));
    }
    Ok(())
}

impl<S: StorageService, C: MonotonicClock> BlockStoragePort for GuardedStorage<S, C> {
    fn load_block(&mut self, kind: RecordKind) -> Result<Block, StorageError> {
        let mut block = [ERASED_BYTE; BLOCK_SIZE];
        self.perform(kind, StorageOp::Load(&mut block))?;
        Ok(block)
    }

    fn clear_then_store(&mut self, kind: RecordKind, bytes: &[u8]) -> Result<(), StorageError> {
        self.perform(kind, StorageOp::ClearThenStore(bytes))
    }
}

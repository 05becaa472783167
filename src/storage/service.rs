//! Contract of the underlying (vendor) storage service.
//!
//! Every request is asynchronous: the submission call only reports whether
//! the request was accepted, and the outcome arrives later through the
//! [`CompletionNotifier`] handed over at registration.  A completion may
//! never arrive at all; bounding that is the job of
//! [`GuardedStorage`](super::GuardedStorage).

use std::sync::Arc;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use heapless::Vec;

use super::BLOCK_SIZE;
use crate::app::ports::ServiceCode;

/// Opaque handle to one contiguous block of non-volatile memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Region(u32);

impl Region {
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Service-defined identifier (typically the block's byte offset).
    pub const fn raw(self) -> u32 {
        self.0
    }
}

/// The set of equally sized regions returned by a single registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegionBlock {
    base: u32,
    stride: u32,
    count: usize,
}

impl RegionBlock {
    /// `stride` is the distance between consecutive regions; it may exceed
    /// the requested block size when the medium erases in larger units.
    pub const fn new(base: u32, stride: u32, count: usize) -> Self {
        Self {
            base,
            stride,
            count,
        }
    }

    pub const fn count(&self) -> usize {
        self.count
    }

    /// Handle of the `index`-th region, or `None` past the end.
    pub fn region(&self, index: usize) -> Option<Region> {
        if index >= self.count {
            return None;
        }
        let offset = self.stride.checked_mul(index as u32)?;
        self.base.checked_add(offset).map(Region)
    }
}

/// Which primitive a completion belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpCode {
    Load,
    Clear,
    Store,
}

/// Upcall payload delivered by the service when a request finishes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub region: Region,
    pub op: OpCode,
    pub status: ServiceCode,
    /// Bytes read by a `Load`; empty for `Clear`/`Store`.
    pub data: Vec<u8, BLOCK_SIZE>,
}

impl Completion {
    pub fn success(region: Region, op: OpCode) -> Self {
        Self {
            region,
            op,
            status: ServiceCode::SUCCESS,
            data: Vec::new(),
        }
    }

    /// Successful load carrying `bytes` (truncated to one block).
    pub fn loaded(region: Region, bytes: &[u8]) -> Self {
        let len = bytes.len().min(BLOCK_SIZE);
        let mut data = Vec::new();
        // Cannot fail: len <= capacity.
        let _ = data.extend_from_slice(&bytes[..len]);
        Self {
            region,
            op: OpCode::Load,
            status: ServiceCode::SUCCESS,
            data,
        }
    }

    pub fn failed(region: Region, op: OpCode, status: ServiceCode) -> Self {
        Self {
            region,
            op,
            status,
            data: Vec::new(),
        }
    }
}

/// Single-slot completion mailbox.  Written from the service's upcall
/// context, drained by the operation waiting on it.
pub type CompletionSignal = Signal<CriticalSectionRawMutex, Completion>;

/// Cloneable handle the service uses to report completions.
#[derive(Clone)]
pub struct CompletionNotifier(Arc<CompletionSignal>);

impl CompletionNotifier {
    pub(crate) fn new(signal: Arc<CompletionSignal>) -> Self {
        Self(signal)
    }

    /// Deliver a completion.  Safe to call from interrupt/upcall context;
    /// an untaken earlier completion is overwritten.
    pub fn complete(&self, completion: Completion) {
        self.0.signal(completion);
    }
}

/// The vendor storage service, as seen by this firmware.
///
/// Exactly one request may be outstanding at a time; callers serialise
/// through [`GuardedStorage`](super::GuardedStorage).
pub trait StorageService {
    /// Reserve `count` regions of `block_size` bytes each and install the
    /// completion upcall.  Called once at start-up.
    fn register(
        &mut self,
        block_size: usize,
        count: usize,
        notifier: CompletionNotifier,
    ) -> Result<RegionBlock, ServiceCode>;

    /// Request `size` bytes of `region` starting at `offset`.
    fn load(&mut self, region: Region, size: usize, offset: usize) -> Result<(), ServiceCode>;

    /// Request that `size` bytes of `region` be reset to the erase pattern.
    fn clear(&mut self, region: Region, size: usize) -> Result<(), ServiceCode>;

    /// Request that `src` be written into `region` at `offset`.
    /// The service copies `src` before returning.
    fn store(&mut self, region: Region, src: &[u8], offset: usize) -> Result<(), ServiceCode>;
}

//! Flash storage service adapter.
//!
//! Implements [`StorageService`] for the Ladybug record regions.
//!
//! - **`target_os = "espidf"`** — one sector per region inside the
//!   `ladybug` data partition (see `partitions.csv`).  The ESP-IDF
//!   partition API is synchronous, so each completion is signalled before
//!   the submitting call returns.
//! - **`not(target_os = "espidf")`** — RAM-backed simulation with fault
//!   injection (stalled, failed, rejected and delayed completions) for
//!   host-side testing.

use log::info;

use crate::app::ports::ServiceCode;
use crate::records::ERASED_BYTE;
use crate::storage::{
    BLOCK_SIZE, Completion, CompletionNotifier, OpCode, Region, RegionBlock, StorageService,
};

#[cfg(target_os = "espidf")]
use esp_idf_sys::*;

#[cfg(not(target_os = "espidf"))]
use std::time::Duration;

/// Partition label in `partitions.csv`.
pub const PARTITION_LABEL: &core::ffi::CStr = c"ladybug";
/// Custom data subtype of the record partition.
pub const PARTITION_SUBTYPE: u8 = 0x40;

/// Erase granularity of the SPI flash; each region gets its own sector.
#[cfg(target_os = "espidf")]
const SECTOR_SIZE: u32 = 4_096;

/// Failure modes the simulation can be told to produce.
#[cfg(not(target_os = "espidf"))]
#[derive(Debug, Default, Clone)]
struct SimFaults {
    /// Reject `register` with this code.
    registration: Option<ServiceCode>,
    /// Reject the next submission with this code.
    reject_next: Option<ServiceCode>,
    /// Accept the next N submissions but never complete them.
    stall: u32,
    /// Complete every request with this status.
    status: Option<ServiceCode>,
    /// Deliver completions from a helper thread after this delay.
    delay: Option<Duration>,
}

pub struct FlashAdapter {
    notifier: Option<CompletionNotifier>,
    block: Option<RegionBlock>,
    #[cfg(target_os = "espidf")]
    partition: *const esp_partition_t,
    #[cfg(not(target_os = "espidf"))]
    memory: Vec<u8>,
    #[cfg(not(target_os = "espidf"))]
    faults: SimFaults,
    #[cfg(not(target_os = "espidf"))]
    ops: Vec<(OpCode, Region)>,
    #[cfg(not(target_os = "espidf"))]
    abandoned: Vec<Completion>,
}

impl FlashAdapter {
    /// Locate the record partition.
    #[cfg(target_os = "espidf")]
    pub fn new() -> Result<Self, ServiceCode> {
        // SAFETY: read-only lookup in the partition table; the returned
        // pointer is valid for the lifetime of the program.
        let partition = unsafe {
            esp_partition_find_first(
                esp_partition_type_t_ESP_PARTITION_TYPE_DATA,
                PARTITION_SUBTYPE as esp_partition_subtype_t,
                PARTITION_LABEL.as_ptr(),
            )
        };
        if partition.is_null() {
            log::error!("FlashAdapter: partition {:?} not found", PARTITION_LABEL);
            return Err(ServiceCode(ESP_ERR_NOT_FOUND as i32));
        }
        // SAFETY: non-null pointer from esp_partition_find_first.
        let size = unsafe { (*partition).size };
        info!("FlashAdapter: partition {:?} ({} bytes)", PARTITION_LABEL, size);
        Ok(Self {
            notifier: None,
            block: None,
            partition,
        })
    }

    /// Fresh, fully erased simulated flash.
    #[cfg(not(target_os = "espidf"))]
    pub fn new() -> Result<Self, ServiceCode> {
        info!("FlashAdapter: simulation backend");
        Ok(Self {
            notifier: None,
            block: None,
            memory: Vec::new(),
            faults: SimFaults::default(),
            ops: Vec::new(),
            abandoned: Vec::new(),
        })
    }

    fn notify(&self, completion: Completion) {
        if let Some(notifier) = &self.notifier {
            notifier.complete(completion);
        }
    }

    /// Bounds check shared by both backends.  Returns the byte offset.
    fn locate(&self, region: Region, size: usize, offset: usize) -> Result<usize, ServiceCode> {
        let block = self.block.ok_or(ServiceCode(ERR_NOT_REGISTERED))?;
        let known = (0..block.count()).any(|i| block.region(i) == Some(region));
        if !known || size == 0 || offset.saturating_add(size) > BLOCK_SIZE {
            return Err(ServiceCode(ERR_INVALID_ARG));
        }
        Ok(region.raw() as usize + offset)
    }
}

/// Status codes reported by the simulation and by argument checks.
const ERR_INVALID_ARG: i32 = 0x102;
const ERR_NOT_REGISTERED: i32 = 0x103;

// ───────────────────────────────────────────────────────────────
// ESP-IDF backend
// ───────────────────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
impl StorageService for FlashAdapter {
    fn register(
        &mut self,
        block_size: usize,
        count: usize,
        notifier: CompletionNotifier,
    ) -> Result<RegionBlock, ServiceCode> {
        // SAFETY: partition pointer validated in new().
        let size = unsafe { (*self.partition).size };
        let needed = SECTOR_SIZE as usize * count;
        if block_size > SECTOR_SIZE as usize || needed > size as usize {
            log::error!(
                "FlashAdapter: {} x {}B regions do not fit {} bytes",
                count,
                block_size,
                size
            );
            return Err(ServiceCode(ESP_ERR_INVALID_SIZE as i32));
        }
        let block = RegionBlock::new(0, SECTOR_SIZE, count);
        self.block = Some(block);
        self.notifier = Some(notifier);
        info!("FlashAdapter: {} regions registered", count);
        Ok(block)
    }

    fn load(&mut self, region: Region, size: usize, offset: usize) -> Result<(), ServiceCode> {
        let at = self.locate(region, size, offset)?;
        let mut buf = [ERASED_BYTE; BLOCK_SIZE];
        // SAFETY: buf outlives the call and holds at least `size` bytes.
        let ret = unsafe {
            esp_partition_read(self.partition, at, buf.as_mut_ptr().cast(), size)
        };
        let completion = if ret == ESP_OK as i32 {
            Completion::loaded(region, &buf[..size])
        } else {
            Completion::failed(region, OpCode::Load, ServiceCode(ret))
        };
        self.notify(completion);
        Ok(())
    }

    fn clear(&mut self, region: Region, size: usize) -> Result<(), ServiceCode> {
        self.locate(region, size, 0)?;
        // Erase works on whole sectors; the region owns exactly one.
        // SAFETY: offset and length are sector aligned and inside the partition.
        let ret = unsafe {
            esp_partition_erase_range(self.partition, region.raw() as usize, SECTOR_SIZE as usize)
        };
        self.notify(if ret == ESP_OK as i32 {
            Completion::success(region, OpCode::Clear)
        } else {
            Completion::failed(region, OpCode::Clear, ServiceCode(ret))
        });
        Ok(())
    }

    fn store(&mut self, region: Region, src: &[u8], offset: usize) -> Result<(), ServiceCode> {
        let at = self.locate(region, src.len(), offset)?;
        // SAFETY: src is a live slice for the duration of the call.
        let ret = unsafe {
            esp_partition_write(self.partition, at, src.as_ptr().cast(), src.len())
        };
        self.notify(if ret == ESP_OK as i32 {
            Completion::success(region, OpCode::Store)
        } else {
            Completion::failed(region, OpCode::Store, ServiceCode(ret))
        });
        Ok(())
    }
}

// ───────────────────────────────────────────────────────────────
// Simulation backend
// ───────────────────────────────────────────────────────────────

#[cfg(not(target_os = "espidf"))]
impl FlashAdapter {
    /// Make the next `register` fail with `code`.
    pub fn sim_fail_registration(&mut self, code: ServiceCode) {
        self.faults.registration = Some(code);
    }

    /// Make the next submission fail synchronously with `code`.
    pub fn sim_reject_next(&mut self, code: ServiceCode) {
        self.faults.reject_next = Some(code);
    }

    /// Accept the next `count` requests but never complete them.
    pub fn sim_stall(&mut self, count: u32) {
        self.faults.stall = count;
    }

    /// Complete every following request with `status` (`None` restores success).
    pub fn sim_completion_status(&mut self, status: Option<ServiceCode>) {
        self.faults.status = status;
    }

    /// Deliver completions from another thread after `delay`.
    pub fn sim_delay_completions(&mut self, delay: Option<Duration>) {
        self.faults.delay = delay;
    }

    /// Deliver the completions of every stalled request, late.
    pub fn sim_release_stalled(&mut self) {
        for completion in core::mem::take(&mut self.abandoned) {
            self.notify(completion);
        }
    }

    /// Every accepted request, in submission order.
    pub fn sim_ops(&self) -> &[(OpCode, Region)] {
        &self.ops
    }

    pub fn sim_clear_ops(&mut self) {
        self.ops.clear();
    }

    /// Current bytes of `region`.
    pub fn sim_region_bytes(&self, region: Region) -> &[u8] {
        let at = region.raw() as usize;
        &self.memory[at..at + BLOCK_SIZE]
    }

    /// Overwrite `region` directly, bypassing the service.
    pub fn sim_write_raw(&mut self, region: Region, bytes: &[u8]) {
        let at = region.raw() as usize;
        self.memory[at..at + bytes.len()].copy_from_slice(bytes);
    }

    fn sim_submit(&mut self, op: OpCode, region: Region) -> Result<bool, ServiceCode> {
        if let Some(code) = self.faults.reject_next.take() {
            return Err(code);
        }
        self.ops.push((op, region));
        if self.faults.stall > 0 {
            self.faults.stall -= 1;
            return Ok(false);
        }
        Ok(true)
    }

    fn sim_complete(&mut self, mut completion: Completion, deliver: bool) {
        if let Some(status) = self.faults.status {
            completion.status = status;
            completion.data.clear();
        }
        if !deliver {
            self.abandoned.push(completion);
            return;
        }
        match (self.faults.delay, self.notifier.clone()) {
            (Some(delay), Some(notifier)) => {
                std::thread::spawn(move || {
                    std::thread::sleep(delay);
                    notifier.complete(completion);
                });
            }
            _ => self.notify(completion),
        }
    }
}

#[cfg(not(target_os = "espidf"))]
impl StorageService for FlashAdapter {
    fn register(
        &mut self,
        block_size: usize,
        count: usize,
        notifier: CompletionNotifier,
    ) -> Result<RegionBlock, ServiceCode> {
        if let Some(code) = self.faults.registration.take() {
            return Err(code);
        }
        if block_size != BLOCK_SIZE {
            return Err(ServiceCode(ERR_INVALID_ARG));
        }
        // Re-registration (a simulated reboot) keeps the contents.
        if self.memory.len() != block_size * count {
            self.memory = vec![ERASED_BYTE; block_size * count];
        }
        let block = RegionBlock::new(0, block_size as u32, count);
        self.block = Some(block);
        self.notifier = Some(notifier);
        Ok(block)
    }

    fn load(&mut self, region: Region, size: usize, offset: usize) -> Result<(), ServiceCode> {
        let at = self.locate(region, size, offset)?;
        let deliver = self.sim_submit(OpCode::Load, region)?;
        let completion = Completion::loaded(region, &self.memory[at..at + size]);
        self.sim_complete(completion, deliver);
        Ok(())
    }

    fn clear(&mut self, region: Region, size: usize) -> Result<(), ServiceCode> {
        let at = self.locate(region, size, 0)?;
        let deliver = self.sim_submit(OpCode::Clear, region)?;
        if deliver && self.faults.status.is_none() {
            self.memory[at..at + size].fill(ERASED_BYTE);
        }
        self.sim_complete(Completion::success(region, OpCode::Clear), deliver);
        Ok(())
    }

    fn store(&mut self, region: Region, src: &[u8], offset: usize) -> Result<(), ServiceCode> {
        let at = self.locate(region, src.len(), offset)?;
        let deliver = self.sim_submit(OpCode::Store, region)?;
        if deliver && self.faults.status.is_none() {
            // NOR semantics: a write can only clear bits.
            for (cell, &byte) in self.memory[at..at + src.len()].iter_mut().zip(src) {
                *cell &= byte;
            }
        }
        self.sim_complete(Completion::success(region, OpCode::Store), deliver);
        Ok(())
    }
}

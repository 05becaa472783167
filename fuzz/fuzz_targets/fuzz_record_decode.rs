//! Fuzz target: record restore from raw flash blocks
//!
//! Treats the input as the contents of a storage region and restores every
//! record kind from it.  Restoring must never panic, and an adopted
//! record must re-encode to a full sentinel-prefixed payload.
//!
//! cargo fuzz run fuzz_record_decode

#![no_main]

use ladybug::records::{
    Block, CalibrationValues, DeviceName, ERASED_BYTE, PlantInfo, Record, RecordCell,
    SENTINEL_LEN,
};
use ladybug::storage::BLOCK_SIZE;
use libfuzzer_sys::fuzz_target;

fn check<R: Record>(block: &Block) {
    let mut cell = RecordCell::<R>::new();
    if !cell.restore(block) {
        cell.mark_dirty();
        let bytes = cell.take_dirty().expect("dirty record yields bytes");
        assert_eq!(bytes.len(), SENTINEL_LEN + R::PAYLOAD_LEN);
    }
}

fuzz_target!(|data: &[u8]| {
    let mut block = [ERASED_BYTE; BLOCK_SIZE];
    let n = data.len().min(BLOCK_SIZE);
    block[..n].copy_from_slice(&data[..n]);

    check::<CalibrationValues>(&block);
    check::<PlantInfo>(&block);
    check::<DeviceName>(&block);
});

//! Guarded storage against the simulated flash service.

use std::time::Duration;

use ladybug::adapters::flash::FlashAdapter;
use ladybug::app::ports::{BlockStoragePort, ServiceCode, StorageError};
use ladybug::records::{ERASED_BYTE, WRITE_CHECK};
use ladybug::storage::{BLOCK_SIZE, GuardedStorage, OpCode, RecordKind, StorageOp};

use crate::mock_hw::{SteppingClock, TEST_TIMEOUT, reboot, sim_storage, threaded_storage};

#[test]
fn regions_are_distinct_and_stable() {
    let storage = sim_storage();
    let regions = storage.regions();
    let cal = regions.region(RecordKind::Calibration);
    let plant = regions.region(RecordKind::PlantInfo);
    let name = regions.region(RecordKind::DeviceName);
    assert_ne!(cal, plant);
    assert_ne!(plant, name);
    assert_ne!(cal, name);
    assert_eq!(regions.kind_of(plant), Some(RecordKind::PlantInfo));
}

#[test]
fn registration_failure_is_reported() {
    let mut flash = FlashAdapter::new().unwrap();
    flash.sim_fail_registration(ServiceCode(7));
    let result = GuardedStorage::new(flash, SteppingClock::new(100), TEST_TIMEOUT);
    assert!(matches!(
        result,
        Err(StorageError::Registration(ServiceCode(7)))
    ));
}

#[test]
fn clear_then_store_is_two_ordered_requests() {
    let mut storage = sim_storage();
    let region = storage.regions().region(RecordKind::DeviceName);

    storage
        .clear_then_store(RecordKind::DeviceName, &[1, 2, 3])
        .unwrap();

    assert_eq!(
        storage.service().sim_ops(),
        &[(OpCode::Clear, region), (OpCode::Store, region)]
    );
}

#[test]
fn store_touches_only_its_region() {
    let mut storage = sim_storage();
    let bytes = [0x11u8; BLOCK_SIZE];
    storage
        .clear_then_store(RecordKind::PlantInfo, &bytes)
        .unwrap();

    assert_eq!(storage.load_block(RecordKind::PlantInfo).unwrap(), bytes);
    for kind in [RecordKind::Calibration, RecordKind::DeviceName] {
        assert_eq!(
            storage.load_block(kind).unwrap(),
            [ERASED_BYTE; BLOCK_SIZE]
        );
    }
}

#[test]
fn rewrite_replaces_previous_contents() {
    let mut storage = sim_storage();
    storage
        .clear_then_store(RecordKind::Calibration, &[0x0F; 8])
        .unwrap();
    storage
        .clear_then_store(RecordKind::Calibration, &[0xF0; 4])
        .unwrap();

    let block = storage.load_block(RecordKind::Calibration).unwrap();
    assert_eq!(&block[..4], &[0xF0; 4]);
    assert!(block[4..].iter().all(|&b| b == ERASED_BYTE));
}

#[test]
fn stalled_load_times_out_within_bound() {
    let clock = SteppingClock::new(100);
    let mut flash = FlashAdapter::new().unwrap();
    flash.sim_stall(1);
    let mut storage = GuardedStorage::new(flash, &clock, TEST_TIMEOUT).unwrap();

    assert_eq!(
        storage.load_block(RecordKind::Calibration),
        Err(StorageError::TimedOut)
    );
    let bound_us = TEST_TIMEOUT.as_micros() as u64 + 2 * 100;
    assert!(
        clock.elapsed_us() <= bound_us,
        "waited {}us, bound {}us",
        clock.elapsed_us(),
        bound_us
    );
    assert!(storage.is_idle());
}

#[test]
fn stalled_clear_aborts_before_store() {
    let mut storage = sim_storage();
    storage.service_mut().sim_stall(1);

    assert_eq!(
        storage.clear_then_store(RecordKind::Calibration, &[0; 4]),
        Err(StorageError::TimedOut)
    );
    let ops: Vec<_> = storage.service().sim_ops().iter().map(|(op, _)| *op).collect();
    assert_eq!(ops, vec![OpCode::Clear]);
}

#[test]
fn late_completion_is_discarded() {
    let mut storage = sim_storage();
    storage
        .clear_then_store(RecordKind::Calibration, &[0xAA; 4])
        .unwrap();

    storage.service_mut().sim_stall(1);
    assert_eq!(
        storage.load_block(RecordKind::Calibration),
        Err(StorageError::TimedOut)
    );

    // The abandoned load now completes, carrying stale data.
    storage.service_mut().sim_release_stalled();
    storage
        .clear_then_store(RecordKind::Calibration, &[0x55; 4])
        .unwrap();

    let block = storage.load_block(RecordKind::Calibration).unwrap();
    assert_eq!(&block[..4], &[0x55; 4]);
}

#[test]
fn failed_completion_surfaces_status() {
    let mut storage = sim_storage();
    storage
        .service_mut()
        .sim_completion_status(Some(ServiceCode(9)));

    assert_eq!(
        storage.load_block(RecordKind::PlantInfo),
        Err(StorageError::Service(ServiceCode(9)))
    );
    assert_eq!(
        storage.clear_then_store(RecordKind::PlantInfo, &[1]),
        Err(StorageError::Service(ServiceCode(9)))
    );
    assert!(storage.is_idle());
}

#[test]
fn rejected_submission_surfaces_status() {
    let mut storage = sim_storage();
    storage.service_mut().sim_reject_next(ServiceCode(4));
    assert_eq!(
        storage.load_block(RecordKind::DeviceName),
        Err(StorageError::Service(ServiceCode(4)))
    );
    assert!(storage.service().sim_ops().is_empty());
    assert!(storage.load_block(RecordKind::DeviceName).is_ok());
}

#[test]
fn invalid_transfers_never_reach_the_service() {
    let mut storage = sim_storage();
    let mut empty: [u8; 0] = [];
    assert!(matches!(
        storage.perform(RecordKind::Calibration, StorageOp::Load(&mut empty)),
        Err(StorageError::InvalidInput(_))
    ));
    assert!(matches!(
        storage.clear_then_store(RecordKind::Calibration, &[0u8; BLOCK_SIZE + 1]),
        Err(StorageError::InvalidInput(_))
    ));
    assert!(matches!(
        storage.clear_then_store(RecordKind::Calibration, &[]),
        Err(StorageError::InvalidInput(_))
    ));
    assert!(storage.service().sim_ops().is_empty());
}

#[test]
fn partial_load_reads_region_prefix() {
    let mut storage = sim_storage();
    storage
        .clear_then_store(RecordKind::Calibration, &WRITE_CHECK.to_le_bytes())
        .unwrap();
    let mut sentinel = [0u8; 4];
    storage
        .perform(RecordKind::Calibration, StorageOp::Load(&mut sentinel))
        .unwrap();
    assert_eq!(u32::from_le_bytes(sentinel), WRITE_CHECK);
}

#[test]
fn contents_survive_reboot() {
    let mut storage = sim_storage();
    storage
        .clear_then_store(RecordKind::DeviceName, &[9, 8, 7])
        .unwrap();

    let mut storage = reboot(storage);
    let block = storage.load_block(RecordKind::DeviceName).unwrap();
    assert_eq!(&block[..3], &[9, 8, 7]);
}

#[test]
fn completion_from_another_thread_is_awaited() {
    let mut storage = threaded_storage(Duration::from_secs(2));
    storage
        .service_mut()
        .sim_delay_completions(Some(Duration::from_millis(20)));

    storage
        .clear_then_store(RecordKind::PlantInfo, &[0x42; 6])
        .unwrap();
    let block = storage.load_block(RecordKind::PlantInfo).unwrap();
    assert_eq!(&block[..6], &[0x42; 6]);
}

#[test]
fn completion_after_timeout_does_not_leak_into_next_operation() {
    let mut storage = threaded_storage(Duration::from_millis(20));
    storage
        .service_mut()
        .sim_delay_completions(Some(Duration::from_millis(150)));

    assert_eq!(
        storage.load_block(RecordKind::Calibration),
        Err(StorageError::TimedOut)
    );

    // Let the late completion land, then run a prompt operation.
    std::thread::sleep(Duration::from_millis(300));
    storage.service_mut().sim_delay_completions(None);
    storage
        .clear_then_store(RecordKind::Calibration, &[0x33; 4])
        .unwrap();
    let block = storage.load_block(RecordKind::Calibration).unwrap();
    assert_eq!(&block[..4], &[0x33; 4]);
}

#[test]
fn late_completion_of_another_op_is_skipped_while_waiting() {
    let mut storage = threaded_storage(Duration::from_millis(250));
    storage
        .service_mut()
        .sim_delay_completions(Some(Duration::from_millis(550)));
    assert_eq!(
        storage.load_block(RecordKind::Calibration),
        Err(StorageError::TimedOut)
    );

    // The abandoned load completes while the store below is still pending.
    storage
        .service_mut()
        .sim_delay_completions(Some(Duration::from_millis(200)));
    storage
        .clear_then_store(RecordKind::Calibration, &[0x77; 4])
        .unwrap();
    assert!(storage.is_idle());

    storage.service_mut().sim_delay_completions(None);
    let block = storage.load_block(RecordKind::Calibration).unwrap();
    assert_eq!(&block[..4], &[0x77; 4]);
}

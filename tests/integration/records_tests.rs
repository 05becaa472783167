//! Record state managers over guarded storage.

use ladybug::app::ports::BlockStoragePort;
use ladybug::records::calibration::{PH_HIGH_IDEAL_MV, PH_LOW_IDEAL_MV};
use ladybug::records::device_name::DEFAULT_DEVICE_NAME;
use ladybug::records::{
    EcCalibration, EcPoint, PhPoint, PlantInfo, RecordError, RecordStore, SENTINEL_LEN,
    WRITE_CHECK,
};
use ladybug::storage::RecordKind;

use crate::mock_hw::{reboot, sim_storage};

/// Persist every dirty record the way the main loop does.
fn write_back(store: &mut RecordStore, storage: &mut impl BlockStoragePort) {
    for kind in RecordKind::ALL {
        if let Some(bytes) = store.poll(kind) {
            storage.clear_then_store(kind, &bytes).unwrap();
        }
    }
}

#[test]
fn erased_calibration_boots_to_ideal_defaults() {
    let mut storage = sim_storage();
    let mut store = RecordStore::new();

    assert!(store.load(RecordKind::Calibration, &mut storage).unwrap());
    let cal = *store.calibration();
    assert_eq!(cal.ph(PhPoint::Low), 178);
    assert_eq!(cal.ph(PhPoint::High), 0);
    assert_eq!(cal.ec(EcPoint::First), &EcCalibration::default());
    assert_eq!(cal.ec(EcPoint::Second), &EcCalibration::default());
    assert!(store.is_dirty(RecordKind::Calibration));

    let bytes = store.poll(RecordKind::Calibration).unwrap();
    let mut expected = WRITE_CHECK.to_le_bytes().to_vec();
    expected.extend_from_slice(&cal.to_bytes());
    assert_eq!(bytes.as_slice(), expected.as_slice());
}

#[test]
fn persisted_record_round_trips_byte_identical() {
    let mut storage = sim_storage();
    let mut store = RecordStore::new();
    store.load_all(&mut storage).unwrap();
    store.set_ph_point(PhPoint::Low, 171);
    store.set_ec_point(EcPoint::Second, 12_880, [700, 450]);
    store.set_plant_info("lettuce", "seedling").unwrap();

    let mut written = Vec::new();
    for kind in RecordKind::ALL {
        let bytes = store.poll(kind).unwrap();
        storage.clear_then_store(kind, &bytes).unwrap();
        written.push((kind, bytes));
    }

    for (kind, bytes) in written {
        let block = storage.load_block(kind).unwrap();
        assert_eq!(&block[..SENTINEL_LEN], &WRITE_CHECK.to_le_bytes());
        assert_eq!(&block[..bytes.len()], bytes.as_slice());
    }
}

#[test]
fn reboot_restores_everything_clean() {
    let mut storage = sim_storage();
    let mut store = RecordStore::new();
    store.load_all(&mut storage).unwrap();
    store.set_ec_point(EcPoint::First, 1_413, [512, 300]);
    store.set_device_name("bed-4").unwrap();
    store.set_plant_info("pepper", "fruit").unwrap();
    write_back(&mut store, &mut storage);

    let mut storage = reboot(storage);
    let mut rebooted = RecordStore::new();
    let report = rebooted.load_all(&mut storage).unwrap();

    assert!(!report.any_defaulted());
    for kind in RecordKind::ALL {
        assert!(!rebooted.is_dirty(kind));
    }
    assert_eq!(rebooted.calibration(), store.calibration());
    assert_eq!(rebooted.device_name().as_str(), "bed-4");
    assert_eq!(rebooted.plant_info().plant_type(), Some("pepper"));
    assert_eq!(rebooted.plant_info().growth_stage(), Some("fruit"));
}

#[test]
fn defaults_are_persisted_on_first_write_back() {
    let mut storage = sim_storage();
    let mut store = RecordStore::new();
    let report = store.load_all(&mut storage).unwrap();
    assert!(report.defaulted(RecordKind::PlantInfo));
    write_back(&mut store, &mut storage);

    let mut storage = reboot(storage);
    let mut rebooted = RecordStore::new();
    let report = rebooted.load_all(&mut storage).unwrap();
    assert!(!report.any_defaulted());
    assert_eq!(rebooted.plant_info(), &PlantInfo::default());
    assert_eq!(rebooted.device_name().as_str(), DEFAULT_DEVICE_NAME);
}

#[test]
fn corrupt_sentinel_falls_back_to_defaults() {
    let mut storage = sim_storage();
    let region = storage.regions().region(RecordKind::Calibration);
    let mut garbage = [0u8; 20];
    garbage[..4].copy_from_slice(&0x0403_0201u32.to_le_bytes());
    storage.service_mut().sim_write_raw(region, &garbage);

    let mut store = RecordStore::new();
    assert!(store.load(RecordKind::Calibration, &mut storage).unwrap());
    assert_eq!(store.calibration().ph(PhPoint::Low), PH_LOW_IDEAL_MV);
    assert!(store.is_dirty(RecordKind::Calibration));
}

#[test]
fn erased_name_payload_uses_default_name() {
    let mut storage = sim_storage();
    storage
        .clear_then_store(RecordKind::DeviceName, &WRITE_CHECK.to_le_bytes())
        .unwrap();

    let mut store = RecordStore::new();
    assert!(store.load(RecordKind::DeviceName, &mut storage).unwrap());
    assert_eq!(store.device_name().as_str(), "LBL");
}

#[test]
fn dirty_flag_is_handed_out_exactly_once() {
    let mut store = RecordStore::new();
    store.undo_ph_point(PhPoint::High, -3);
    assert!(store.poll(RecordKind::Calibration).is_some());
    assert!(store.poll(RecordKind::Calibration).is_none());

    // A mutation after the hand-off is captured by the next poll.
    store.reset_ph();
    assert!(store.poll(RecordKind::Calibration).is_some());
    assert!(store.poll(RecordKind::Calibration).is_none());
}

#[test]
fn ec_calibration_scenario() {
    let mut store = RecordStore::new();
    store.set_ec_point(EcPoint::First, 1_413, [512, 300]);
    let first = *store.calibration().ec(EcPoint::First);
    store.set_ec_point(EcPoint::Second, 12_880, [700, 450]);

    let cal = store.calibration();
    assert_eq!(cal.ec(EcPoint::First), &first);
    assert_eq!(cal.ec(EcPoint::Second).mv(), [700, 450]);
    assert_ne!(cal.ec(EcPoint::First).solution, cal.ec(EcPoint::Second).solution);
}

#[test]
fn ph_points_do_not_disturb_each_other() {
    let mut store = RecordStore::new();
    store.set_ec_point(EcPoint::First, 1_413, [512, 300]);
    let before = *store.calibration();

    store.set_ph_point(PhPoint::High, -7);
    let after = store.calibration();
    assert_eq!(after.ph(PhPoint::Low), before.ph(PhPoint::Low));
    assert_eq!(after.ec(EcPoint::First), before.ec(EcPoint::First));
    assert_eq!(after.ec(EcPoint::Second), before.ec(EcPoint::Second));
}

#[test]
fn reset_scope() {
    let mut store = RecordStore::new();
    store.set_ph_point(PhPoint::Low, 150);
    store.set_ph_point(PhPoint::High, 12);
    store.set_ec_point(EcPoint::First, 1_413, [512, 300]);
    store.set_ec_point(EcPoint::Second, 12_880, [700, 450]);

    store.reset_ec();
    let cal = *store.calibration();
    assert_eq!(cal.ec(EcPoint::First), &EcCalibration::default());
    assert_eq!(cal.ec(EcPoint::Second), &EcCalibration::default());
    assert_eq!(cal.ph(PhPoint::Low), 150);

    store.reset_ph();
    let cal = store.calibration();
    assert_eq!(cal.ph(PhPoint::Low), PH_LOW_IDEAL_MV);
    assert_eq!(cal.ph(PhPoint::High), PH_HIGH_IDEAL_MV);
}

#[test]
fn over_long_device_name_is_invalid_input() {
    let mut store = RecordStore::new();
    let err = store.set_device_name_bytes(&[b'z'; 30]).unwrap_err();
    assert_eq!(err, RecordError::NameTooLong { len: 30, max: 24 });
    assert!(!store.is_dirty(RecordKind::DeviceName));
}

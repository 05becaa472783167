//! End-to-end flows through [`HydroService`]: control frames in,
//! notifications out, write-back through guarded storage.

use std::time::{Duration, Instant};

use ladybug::adapters::flash::FlashAdapter;
use ladybug::app::commands::{CommandError, ControlCommand};
use ladybug::app::events::{Measurements, Notification};
use ladybug::app::link::{self, FrameChannel};
use ladybug::app::ports::{ServiceCode, StorageError};
use ladybug::app::service::HydroService;
use ladybug::config::FirmwareConfig;
use ladybug::error::Error;
use ladybug::records::{EcPoint, PhPoint};
use ladybug::storage::{GuardedStorage, OpCode, RecordKind};

use crate::mock_hw::{
    RecordingSink, ScriptedProbe, SteppingClock, reboot, sim_storage, threaded_storage,
};

fn booted() -> (HydroService, GuardedStorage<FlashAdapter, SteppingClock>) {
    let mut storage = sim_storage();
    let mut app = HydroService::new(&FirmwareConfig::default());
    app.boot(&mut storage).unwrap();
    (app, storage)
}

#[test]
fn first_boot_persists_defaults_once() {
    let (mut app, mut storage) = booted();
    assert!(app.has_dirty());

    assert_eq!(app.flush_dirty(&mut storage), Ok(3));
    assert!(!app.has_dirty());
    assert_eq!(app.flush_dirty(&mut storage), Ok(0));
}

#[test]
fn ec_calibration_frames_store_probe_readings() {
    let (mut app, _storage) = booted();
    let mut probe = ScriptedProbe::new().with_ec(512, 300).with_ec(700, 450);
    let mut sink = RecordingSink::new();

    let [lo, hi] = 1_413u16.to_le_bytes();
    app.handle_frame(&[5, lo, hi], &mut probe, &mut sink).unwrap();
    let [lo, hi] = 12_880u16.to_le_bytes();
    app.handle_frame(&[6, lo, hi], &mut probe, &mut sink).unwrap();

    let cal = app.records().calibration();
    assert_eq!(cal.ec(EcPoint::First).solution, 1_413);
    assert_eq!(cal.ec(EcPoint::First).mv(), [512, 300]);
    assert_eq!(cal.ec(EcPoint::Second).solution, 12_880);
    assert_eq!(cal.ec(EcPoint::Second).mv(), [700, 450]);
    assert_eq!(sink.sent.len(), 2);
    assert_eq!(sink.last(), Some(&Notification::Calibration(*cal)));
}

#[test]
fn undo_restores_client_supplied_values() {
    let (mut app, _storage) = booted();
    let mut probe = ScriptedProbe::new().with_ph(160);
    let mut sink = RecordingSink::new();

    app.handle_command(ControlCommand::CalibratePh(PhPoint::Low), &mut probe, &mut sink)
        .unwrap();
    assert_eq!(app.records().calibration().ph(PhPoint::Low), 160);

    let mv = 178i16.to_le_bytes();
    app.handle_frame(&[7, mv[0], mv[1]], &mut probe, &mut sink).unwrap();
    assert_eq!(app.records().calibration().ph(PhPoint::Low), 178);
}

#[test]
fn measurement_and_battery_updates_only_notify() {
    let (mut app, mut storage) = booted();
    app.flush_dirty(&mut storage).unwrap();

    let mut probe = ScriptedProbe::new().with_ec(40, 20).with_ph(-15);
    probe.battery_mv = 2_950;
    let mut sink = RecordingSink::new();

    app.handle_frame(&[4], &mut probe, &mut sink).unwrap();
    app.handle_frame(&[11], &mut probe, &mut sink).unwrap();

    assert_eq!(
        sink.sent,
        vec![
            Notification::Measurements(Measurements {
                ec_vin_mv: 40,
                ec_vout_mv: 20,
                ph_mv: -15
            }),
            Notification::BatteryLevel(2_950),
        ]
    );
    assert!(!app.has_dirty());
}

#[test]
fn device_name_survives_reboot() {
    let (mut app, mut storage) = booted();
    let mut sink = RecordingSink::new();
    app.handle_frame(b"\x0cnorth-tank", &mut ScriptedProbe::new(), &mut sink)
        .unwrap();
    app.flush_dirty(&mut storage).unwrap();

    let mut storage = reboot(storage);
    let mut rebooted = HydroService::new(&FirmwareConfig::default());
    let report = rebooted.boot(&mut storage).unwrap();
    assert!(!report.any_defaulted());
    assert_eq!(rebooted.records().device_name().as_str(), "north-tank");
}

#[test]
fn bad_frames_change_nothing() {
    let (mut app, mut storage) = booted();
    app.flush_dirty(&mut storage).unwrap();
    let mut sink = RecordingSink::new();
    let mut probe = ScriptedProbe::new();

    assert_eq!(
        app.handle_frame(&[42], &mut probe, &mut sink),
        Err(Error::Command(CommandError::UnknownOpcode(42)))
    );
    assert_eq!(
        app.handle_frame(&[12], &mut probe, &mut sink),
        Err(Error::Command(CommandError::InvalidName))
    );
    probe.fail = true;
    assert!(app.handle_frame(&[2], &mut probe, &mut sink).is_err());

    assert!(!app.has_dirty());
    assert!(sink.sent.is_empty());
}

#[test]
fn failed_write_back_is_retried_next_cycle() {
    let (mut app, mut storage) = booted();
    app.flush_dirty(&mut storage).unwrap();

    app.handle_command(ControlCommand::ResetEc, &mut ScriptedProbe::new(), &mut RecordingSink::new())
        .unwrap();

    storage.service_mut().sim_stall(1);
    assert_eq!(app.flush_dirty(&mut storage), Err(StorageError::TimedOut));
    assert_eq!(app.storage_failures(), 1);
    assert!(app.records().is_dirty(RecordKind::Calibration));

    storage.service_mut().sim_clear_ops();
    assert_eq!(app.flush_dirty(&mut storage), Ok(1));
    assert_eq!(app.storage_failures(), 0);
    let ops: Vec<_> = storage.service().sim_ops().iter().map(|(op, _)| *op).collect();
    assert_eq!(ops, vec![OpCode::Clear, OpCode::Store]);
}

#[test]
fn persistent_storage_failure_requests_restart() {
    let (mut app, mut storage) = booted();
    storage
        .service_mut()
        .sim_completion_status(Some(ServiceCode(1)));

    for _ in 0..FirmwareConfig::default().max_storage_failures {
        assert!(!app.restart_required());
        assert!(app.flush_dirty(&mut storage).is_err());
    }
    assert!(app.restart_required());
}

#[test]
fn frames_flow_through_the_link_channel() {
    let (mut app, _storage) = booted();
    let channel = FrameChannel::new();
    assert!(link::submit(&channel, &[1]));
    assert!(link::submit(&channel, b"\x0cgh"));

    let mut sink = RecordingSink::new();
    let mut probe = ScriptedProbe::new();
    while let Some(frame) = link::next_frame(&channel) {
        app.handle_frame(&frame, &mut probe, &mut sink).unwrap();
    }
    assert_eq!(sink.sent.len(), 2);
    assert_eq!(app.records().device_name().as_str(), "gh");
}

#[test]
fn plant_info_is_validated_and_persisted() {
    let (mut app, mut storage) = booted();
    app.flush_dirty(&mut storage).unwrap();

    assert!(app.set_plant_info("a very long plant type name", "veg").is_err());
    assert!(!app.has_dirty());

    app.set_plant_info("kale", "veg").unwrap();
    assert_eq!(app.flush_dirty(&mut storage), Ok(1));
}

#[test]
fn slow_write_back_of_every_record_fits_the_watchdog_window() {
    // Enough for one clear + store, not for a full cycle.
    let short = FirmwareConfig {
        storage_timeout_ms: 100,
        loop_interval_ms: 10,
        writeback_interval_ms: 10,
        watchdog_timeout_ms: 201,
        ..FirmwareConfig::default()
    };
    assert!(short.validate().is_err());

    let config = FirmwareConfig {
        watchdog_timeout_ms: short.worst_case_stall_ms() + 1,
        ..short
    };
    config.validate().unwrap();

    let mut storage = threaded_storage(config.storage_timeout());
    let mut app = HydroService::new(&config);
    app.boot(&mut storage).unwrap();
    storage
        .service_mut()
        .sim_delay_completions(Some(Duration::from_millis(60)));

    let started = Instant::now();
    assert_eq!(app.flush_dirty(&mut storage), Ok(3));
    let stall = started.elapsed();

    assert!(stall >= Duration::from_millis(6 * 60));
    assert!(
        stall < Duration::from_millis(u64::from(config.watchdog_timeout_ms)),
        "write-back stalled {:?}, watchdog window {}ms",
        stall,
        config.watchdog_timeout_ms
    );
}

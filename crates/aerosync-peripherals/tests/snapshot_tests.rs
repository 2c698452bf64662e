//! Snapshot tests for command sequences and addressing errors.

use aerosync_engine::prelude::*;
use aerosync_peripherals::camera::Camera;
use aerosync_peripherals::gimbal::{Axis, Gimbal};
use aerosync_test_helpers::prelude::*;
use insta::{assert_debug_snapshot, assert_snapshot};

#[test]
fn test_gimbal_command_sequence() -> TestResult {
    let mut harness = ManualHarness::new();
    let log = CommandLog::new();
    harness.publish(Gimbal::new(log.clone()));
    harness.update::<Gimbal, _>(ComponentKind::Gimbal, |gimbal, session| {
        gimbal.on_supported_axes([Axis::Pitch], session);
        gimbal.on_max_speed(Axis::Pitch, 1.0, 90.0, 45.0, session);
        gimbal.on_stabilization(Axis::Pitch, false, session);
        gimbal.set_max_speed(Axis::Pitch, 120.0, session);
        gimbal.set_max_speed(Axis::Yaw, 10.0, session);
        gimbal.set_stabilization(Axis::Pitch, true, session)
    })?;

    assert_debug_snapshot!(log.commands(), @r"
    [
        MaxSpeed {
            axis: Pitch,
            speed: 90.0,
        },
        Stabilization {
            axis: Pitch,
            enabled: true,
        },
    ]
    ");
    Ok(())
}

#[test]
fn test_wrong_peripheral_type() {
    let mut harness = ManualHarness::new();
    harness.publish(Gimbal::new(Disconnected));

    let err = harness
        .update::<Camera, _>(ComponentKind::Gimbal, |_, _| ())
        .err()
        .map(|err| err.to_string());
    assert_snapshot!(
        err.unwrap_or_default(),
        @"Component Gimbal is not a aerosync_peripherals::camera::Camera"
    );
}

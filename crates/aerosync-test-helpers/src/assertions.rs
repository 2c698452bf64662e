//! Assertion macros for synchronized settings.

/// Assert that two floating-point values are approximately equal.
///
/// ```rust
/// use aerosync_test_helpers::assert_approx_eq;
///
/// assert_approx_eq!(0.1_f64 + 0.2, 0.3, 1e-9);
/// ```
#[macro_export]
macro_rules! assert_approx_eq {
    ($left:expr, $right:expr, $tolerance:expr $(,)?) => {
        let left = $left;
        let right = $right;
        let tolerance = $tolerance;
        let diff = (left - right).abs();
        if diff > tolerance {
            panic!(
                "assertion failed: `(left ≈ right)`\n  left: `{:?}`,\n right: `{:?}`,\n  diff: `{:?}`,\n  tolerance: `{:?}`",
                left, right, diff, tolerance
            );
        }
    };
}

/// Assert that a setting has no pending value and shows `$value`.
///
/// ```rust
/// use aerosync_engine::prelude::*;
/// use aerosync_test_helpers::assert_synced;
///
/// let setting = RangeSetting::new(Bounds::new(5u32, 50), 30);
/// assert_synced!(setting, 30);
/// ```
#[macro_export]
macro_rules! assert_synced {
    ($setting:expr, $value:expr $(,)?) => {
        let setting = &$setting;
        if setting.is_updating() {
            panic!(
                "assertion failed: setting is updating\n  pending: `{:?}`,\n  confirmed: `{:?}`",
                setting.pending(),
                setting.confirmed()
            );
        }
        assert_eq!(*setting.value(), $value, "synced value");
    };
}

/// Assert that a setting waits for the device to confirm `$pending` while
/// `$confirmed` is the last value the device reported.
#[macro_export]
macro_rules! assert_updating {
    ($setting:expr, $pending:expr, $confirmed:expr $(,)?) => {
        let setting = &$setting;
        match setting.pending() {
            Some(pending) => assert_eq!(*pending, $pending, "pending value"),
            None => panic!(
                "assertion failed: setting is synced at `{:?}`",
                setting.value()
            ),
        }
        assert_eq!(*setting.confirmed(), $confirmed, "confirmed value");
        if setting.deadline().is_none() {
            panic!("assertion failed: updating setting has no deadline");
        }
    };
}

#[cfg(test)]
mod tests {
    use aerosync_engine::prelude::*;

    #[test]
    fn test_assert_updating_accepts_pending_setting() {
        let mut timers = ManualTimers::new();
        let mut session = ChangeSession::new(ComponentKind::Geofence, &mut timers);
        let mut altitude = RangeSetting::new(Bounds::new(5u32, 50), 30);
        altitude.request_change(66, |_| true, &mut session);
        assert_updating!(altitude, 50, 30);
    }

    #[test]
    #[should_panic(expected = "setting is updating")]
    fn test_assert_synced_rejects_pending_setting() {
        let mut timers = ManualTimers::new();
        let mut session = ChangeSession::new(ComponentKind::Geofence, &mut timers);
        let mut altitude = RangeSetting::new(Bounds::new(5u32, 50), 30);
        altitude.request_change(40, |_| true, &mut session);
        assert_synced!(altitude, 40);
    }
}

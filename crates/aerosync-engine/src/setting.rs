//! The setting state machine.
//!
//! A [`Setting`] is either `Synced(confirmed)` or
//! `Updating(confirmed, pending, deadline)`. The application reads the
//! effective value (pending if present, else confirmed). A request that the
//! backend accepts is applied optimistically and arms a deadline; the device
//! confirmation, the deadline, the rollback coordinator or a superseding
//! request each end the update cycle.
//!
//! # Invariants
//!
//! - `pending.is_some() == deadline.is_some()`
//! - the confirmed value always satisfies the constraint, see
//!   [`Constraint::conform`]
//!
//! # Example
//!
//! ```rust
//! use aerosync_engine::prelude::*;
//!
//! let mut timers = ManualTimers::new();
//! let mut session = ChangeSession::new(ComponentKind::Geofence, &mut timers);
//!
//! let mut max_altitude: RangeSetting<u32> = RangeSetting::default();
//! max_altitude.confirm_with(Bounds::new(5, 50), 30, &mut session);
//!
//! let mut sent = None;
//! let accepted = max_altitude.request_change(66, |v| { sent = Some(*v); true }, &mut session);
//! assert!(accepted);
//! assert_eq!(sent, Some(50));
//! assert_eq!(*max_altitude.value(), 50);
//! assert!(max_altitude.is_updating());
//! ```

use std::fmt::Debug;
use std::time::Duration;

use crate::constraint::{AnyValue, Bounds, Constraint, DiscreteSet};
use crate::session::ChangeSession;
use crate::timer::TimerHandle;

/// Time a pending change waits for device confirmation before rolling back.
pub(crate) const SETTING_TIMEOUT: Duration = Duration::from_secs(5);

/// Values a setting can hold.
pub trait SettingValue: Clone + PartialEq + Debug + Send + 'static {}

impl<T: Clone + PartialEq + Debug + Send + 'static> SettingValue for T {}

/// Observable synchronization state of a setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyncState {
    /// The effective value is the device-confirmed value.
    Synced,
    /// An optimistic change is waiting for device confirmation.
    Updating,
}

/// A value synchronized with the device.
#[derive(Debug, Clone)]
pub struct Setting<T, C> {
    constraint: C,
    confirmed: T,
    pending: Option<T>,
    deadline: Option<TimerHandle>,
}

/// Setting restricted to a discrete set of values.
pub type EnumSetting<T> = Setting<T, DiscreteSet<T>>;

/// Setting restricted to an inclusive numeric range.
pub type RangeSetting<T> = Setting<T, Bounds<T>>;

/// Boolean setting without constraint.
pub type ToggleSetting = Setting<bool, AnyValue>;

impl<T: Default, C: Default> Default for Setting<T, C> {
    fn default() -> Self {
        Self {
            constraint: C::default(),
            confirmed: T::default(),
            pending: None,
            deadline: None,
        }
    }
}

impl<T, C> Setting<T, C>
where
    T: SettingValue,
    C: Constraint<T>,
{
    /// Create a synced setting with the given constraint and initial value.
    pub fn new(mut constraint: C, initial: T) -> Self {
        let confirmed = constraint.conform(initial);
        Self {
            constraint,
            confirmed,
            pending: None,
            deadline: None,
        }
    }

    /// The effective value: pending if an update is outstanding, else confirmed.
    pub fn value(&self) -> &T {
        self.pending.as_ref().unwrap_or(&self.confirmed)
    }

    /// Last value confirmed by the device.
    pub fn confirmed(&self) -> &T {
        &self.confirmed
    }

    /// Optimistic value awaiting confirmation.
    pub fn pending(&self) -> Option<&T> {
        self.pending.as_ref()
    }

    /// Whether an optimistic change is outstanding.
    pub fn is_updating(&self) -> bool {
        self.pending.is_some()
    }

    /// Current synchronization state.
    pub fn state(&self) -> SyncState {
        if self.is_updating() {
            SyncState::Updating
        } else {
            SyncState::Synced
        }
    }

    /// Deadline armed for the outstanding change.
    pub fn deadline(&self) -> Option<TimerHandle> {
        self.deadline
    }

    /// The current support constraint.
    pub fn constraint(&self) -> &C {
        &self.constraint
    }

    /// Whether any value can be requested right now.
    pub fn is_settable(&self) -> bool {
        self.constraint.is_settable()
    }

    /// Request a new value from the application.
    ///
    /// Unsupported values are silently rejected (discrete) or clamped
    /// (range). A value equal to the effective value is a no-op. Otherwise
    /// the backend is called; when it accepts, the value becomes pending, the
    /// deadline is re-armed and the session is marked dirty.
    ///
    /// `try_set` is the backend adapter: it pushes the value towards the
    /// device and returns `true` when the command was accepted, `false` when
    /// it was rejected.
    ///
    /// Returns `true` when the backend accepted the change.
    pub fn request_change(
        &mut self,
        value: T,
        try_set: impl FnOnce(&T) -> bool,
        session: &mut ChangeSession<'_>,
    ) -> bool {
        let Some(value) = self.constraint.admit(value) else {
            tracing::trace!(kind = %session.kind(), "Rejected unsupported setting value");
            return false;
        };

        if value == *self.value() {
            tracing::trace!(kind = %session.kind(), ?value, "Requested value already effective");
            return false;
        }

        if !try_set(&value) {
            tracing::warn!(kind = %session.kind(), ?value, "Backend rejected setting change");
            return false;
        }

        if let Some(previous) = self.deadline.take() {
            session.cancel_deadline(previous);
        }
        let deadline = session.arm_deadline(SETTING_TIMEOUT);
        tracing::debug!(kind = %session.kind(), ?value, %deadline, "Setting change pending");
        self.pending = Some(value);
        self.deadline = Some(deadline);
        session.mark_dirty();
        true
    }

    /// Apply a value reported by the device.
    ///
    /// The report is authoritative whether or not it matches the pending
    /// value. The session is marked dirty only when the effective value
    /// changed. Returns whether it did.
    pub fn confirm(&mut self, value: T, session: &mut ChangeSession<'_>) -> bool {
        let value = self.constraint.conform(value);
        let changed = *self.value() != value;

        if let Some(deadline) = self.deadline.take() {
            session.cancel_deadline(deadline);
        }
        let was_pending = self.pending.take().is_some();
        self.confirmed = value;

        if changed {
            tracing::debug!(kind = %session.kind(), value = ?self.confirmed, was_pending, "Setting confirmed");
            session.mark_dirty();
        } else {
            tracing::trace!(kind = %session.kind(), was_pending, "Confirmation matches effective value");
        }
        changed
    }

    /// Replace the constraint and apply a device value in one step, as a
    /// device message declaring both would.
    ///
    /// Returns whether the constraint or the effective value changed.
    pub fn confirm_with(&mut self, constraint: C, value: T, session: &mut ChangeSession<'_>) -> bool
    where
        C: PartialEq,
    {
        // The reported value replaces the confirmed one, so the old value is
        // not reconciled against the new constraint.
        let constraint_changed = self.constraint != constraint;
        if constraint_changed {
            self.constraint = constraint;
            session.mark_dirty();
        }
        let value_changed = self.confirm(value, session);
        constraint_changed || value_changed
    }

    /// Replace the support constraint. The constraint is kept exactly as
    /// declared and the confirmed value is reconciled into it: clamped into a
    /// range, or replaced by the first value of a set that no longer contains
    /// it. A pending value is left for the device to settle.
    ///
    /// Returns whether anything observable changed.
    pub fn set_constraint(&mut self, constraint: C, session: &mut ChangeSession<'_>) -> bool
    where
        C: PartialEq,
    {
        if self.constraint == constraint {
            return false;
        }
        self.constraint = constraint;
        let confirmed = self.confirmed.clone();
        self.confirmed = self.constraint.reconcile(confirmed);
        session.mark_dirty();
        true
    }

    /// Handle a deadline firing. Only the currently armed handle rolls the
    /// setting back to its confirmed value; any other handle is stale.
    ///
    /// Returns `true` when the setting was rolled back.
    pub fn on_timeout(&mut self, handle: TimerHandle, session: &mut ChangeSession<'_>) -> bool {
        if self.deadline != Some(handle) {
            return false;
        }
        self.deadline = None;
        let abandoned = self.pending.take();
        tracing::debug!(
            kind = %session.kind(),
            ?abandoned,
            restored = ?self.confirmed,
            "Setting change timed out"
        );
        session.mark_dirty();
        true
    }

    /// Accept the pending value as confirmed without waiting for the device.
    ///
    /// Does not mark the session dirty; the rollback coordinator does so once
    /// for the whole batch. Returns `true` when a pending value was promoted.
    pub fn promote(&mut self, session: &mut ChangeSession<'_>) -> bool {
        let Some(pending) = self.pending.take() else {
            return false;
        };
        if let Some(deadline) = self.deadline.take() {
            session.cancel_deadline(deadline);
        }
        tracing::debug!(kind = %session.kind(), value = ?pending, "Pending setting promoted");
        self.confirmed = pending;
        true
    }

    /// Drop any outstanding change and its deadline without notification.
    pub fn discard_pending(&mut self, session: &mut ChangeSession<'_>) {
        if let Some(deadline) = self.deadline.take() {
            session.cancel_deadline(deadline);
        }
        self.pending = None;
    }
}

/// Type-erased view of a setting used to enumerate every setting of a
/// component regardless of value type.
pub trait SettingControl {
    /// Whether an optimistic change is outstanding.
    fn is_updating(&self) -> bool;

    /// Deadline armed for the outstanding change.
    fn deadline(&self) -> Option<TimerHandle>;

    /// See [`Setting::on_timeout`].
    fn on_timeout(&mut self, handle: TimerHandle, session: &mut ChangeSession<'_>) -> bool;

    /// See [`Setting::promote`].
    fn promote(&mut self, session: &mut ChangeSession<'_>) -> bool;

    /// See [`Setting::discard_pending`].
    fn discard_pending(&mut self, session: &mut ChangeSession<'_>);
}

impl<T, C> SettingControl for Setting<T, C>
where
    T: SettingValue,
    C: Constraint<T>,
{
    fn is_updating(&self) -> bool {
        Setting::is_updating(self)
    }

    fn deadline(&self) -> Option<TimerHandle> {
        Setting::deadline(self)
    }

    fn on_timeout(&mut self, handle: TimerHandle, session: &mut ChangeSession<'_>) -> bool {
        Setting::on_timeout(self, handle, session)
    }

    fn promote(&mut self, session: &mut ChangeSession<'_>) -> bool {
        Setting::promote(self, session)
    }

    fn discard_pending(&mut self, session: &mut ChangeSession<'_>) {
        Setting::discard_pending(self, session);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kind::ComponentKind;
    use crate::timer::ManualTimers;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Flicker {
        Hz50,
        Hz60,
        Auto,
    }

    fn flicker_setting() -> EnumSetting<Flicker> {
        Setting::new(
            DiscreteSet::new([Flicker::Hz50, Flicker::Hz60, Flicker::Auto]),
            Flicker::Hz50,
        )
    }

    #[test]
    fn test_accepted_request_is_pending_and_dirty() {
        let mut timers = ManualTimers::new();
        let mut setting = flicker_setting();
        let mut session = ChangeSession::new(ComponentKind::AntiFlicker, &mut timers);

        assert!(setting.request_change(Flicker::Hz60, |_| true, &mut session));
        assert_eq!(*setting.value(), Flicker::Hz60);
        assert_eq!(*setting.confirmed(), Flicker::Hz50);
        assert_eq!(setting.state(), SyncState::Updating);
        assert!(setting.deadline().is_some());
        assert!(session.is_dirty());
    }

    #[test]
    fn test_unsupported_value_never_reaches_backend() {
        let mut timers = ManualTimers::new();
        let mut setting = Setting::new(DiscreteSet::new([Flicker::Hz50, Flicker::Hz60]), Flicker::Hz50);
        let mut session = ChangeSession::new(ComponentKind::AntiFlicker, &mut timers);
        let mut calls = 0;

        assert!(!setting.request_change(Flicker::Auto, |_| { calls += 1; true }, &mut session));
        assert_eq!(calls, 0);
        assert_eq!(*setting.value(), Flicker::Hz50);
        assert!(!session.is_dirty());
    }

    #[test]
    fn test_same_value_never_reaches_backend() {
        let mut timers = ManualTimers::new();
        let mut setting = flicker_setting();
        let mut session = ChangeSession::new(ComponentKind::AntiFlicker, &mut timers);
        let mut calls = 0;

        assert!(!setting.request_change(Flicker::Hz50, |_| { calls += 1; true }, &mut session));
        assert_eq!(calls, 0);
        assert!(!session.is_dirty());
    }

    #[test]
    fn test_backend_rejection_leaves_state() {
        let mut timers = ManualTimers::new();
        let mut setting = flicker_setting();
        let mut session = ChangeSession::new(ComponentKind::AntiFlicker, &mut timers);
        let mut calls = 0;

        assert!(!setting.request_change(Flicker::Auto, |_| { calls += 1; false }, &mut session));
        assert_eq!(calls, 1);
        assert_eq!(setting.state(), SyncState::Synced);
        assert!(setting.deadline().is_none());
        assert!(!session.is_dirty());
    }

    #[test]
    fn test_superseding_request_rearms_deadline() {
        let mut timers = ManualTimers::new();
        let mut setting = flicker_setting();
        let (first, second) = {
            let mut session = ChangeSession::new(ComponentKind::AntiFlicker, &mut timers);
            setting.request_change(Flicker::Hz60, |_| true, &mut session);
            let first = setting.deadline();
            setting.request_change(Flicker::Auto, |_| true, &mut session);
            (first, setting.deadline())
        };
        assert_ne!(first, second);
        assert_eq!(timers.armed_count(), 1);
        assert!(second.is_some_and(|h| timers.is_armed(h)));
    }

    #[test]
    fn test_confirm_matching_pending_is_silent() {
        let mut timers = ManualTimers::new();
        let mut setting = flicker_setting();
        {
            let mut session = ChangeSession::new(ComponentKind::AntiFlicker, &mut timers);
            setting.request_change(Flicker::Hz60, |_| true, &mut session);
        }
        let mut session = ChangeSession::new(ComponentKind::AntiFlicker, &mut timers);
        assert!(!setting.confirm(Flicker::Hz60, &mut session));
        assert!(!session.is_dirty());
        assert_eq!(setting.state(), SyncState::Synced);
        assert!(setting.deadline().is_none());
        drop(session);
        assert_eq!(timers.armed_count(), 0);
    }

    #[test]
    fn test_confirm_overrides_pending() {
        let mut timers = ManualTimers::new();
        let mut setting = flicker_setting();
        {
            let mut session = ChangeSession::new(ComponentKind::AntiFlicker, &mut timers);
            setting.request_change(Flicker::Hz60, |_| true, &mut session);
        }
        let mut session = ChangeSession::new(ComponentKind::AntiFlicker, &mut timers);
        assert!(setting.confirm(Flicker::Auto, &mut session));
        assert!(session.is_dirty());
        assert_eq!(*setting.value(), Flicker::Auto);
    }

    #[test]
    fn test_duplicate_confirm_is_noop() {
        let mut timers = ManualTimers::new();
        let mut setting = flicker_setting();
        let mut session = ChangeSession::new(ComponentKind::AntiFlicker, &mut timers);
        assert!(!setting.confirm(Flicker::Hz50, &mut session));
        assert!(!session.is_dirty());
    }

    #[test]
    fn test_timeout_rolls_back() {
        let mut timers = ManualTimers::new();
        let mut setting = flicker_setting();
        {
            let mut session = ChangeSession::new(ComponentKind::AntiFlicker, &mut timers);
            setting.request_change(Flicker::Hz60, |_| true, &mut session);
        }
        let fired = timers.advance(SETTING_TIMEOUT);
        assert_eq!(fired.len(), 1);

        let mut session = ChangeSession::new(ComponentKind::AntiFlicker, &mut timers);
        for f in fired {
            assert!(setting.on_timeout(f.handle, &mut session));
        }
        assert!(session.is_dirty());
        assert_eq!(*setting.value(), Flicker::Hz50);
        assert!(setting.deadline().is_none());
    }

    #[test]
    fn test_stale_timeout_is_ignored() {
        let mut timers = ManualTimers::new();
        let mut setting = flicker_setting();
        let mut session = ChangeSession::new(ComponentKind::AntiFlicker, &mut timers);
        setting.request_change(Flicker::Hz60, |_| true, &mut session);
        let stale = setting.deadline();
        setting.request_change(Flicker::Auto, |_| true, &mut session);

        let mut fresh = ChangeSession::new(ComponentKind::AntiFlicker, &mut timers);
        if let Some(stale) = stale {
            assert!(!setting.on_timeout(stale, &mut fresh));
        }
        assert!(!fresh.is_dirty());
        assert_eq!(*setting.value(), Flicker::Auto);
    }

    #[test]
    fn test_promote_keeps_pending_value() {
        let mut timers = ManualTimers::new();
        let mut setting = flicker_setting();
        let mut session = ChangeSession::new(ComponentKind::AntiFlicker, &mut timers);
        setting.request_change(Flicker::Auto, |_| true, &mut session);

        let mut batch = ChangeSession::new(ComponentKind::AntiFlicker, &mut timers);
        assert!(setting.promote(&mut batch));
        assert!(!batch.is_dirty());
        assert_eq!(*setting.confirmed(), Flicker::Auto);
        assert!(!setting.is_updating());
        assert!(!setting.promote(&mut batch));
        drop(batch);
        assert_eq!(timers.armed_count(), 0);
    }

    #[test]
    fn test_range_clamps_request() {
        let mut timers = ManualTimers::new();
        let mut setting: RangeSetting<i32> = Setting::new(Bounds::new(5, 50), 30);
        let mut session = ChangeSession::new(ComponentKind::Geofence, &mut timers);
        let mut received = None;

        assert!(setting.request_change(66, |v| { received = Some(*v); true }, &mut session));
        assert_eq!(received, Some(50));
        assert_eq!(*setting.value(), 50);
    }

    #[test]
    fn test_range_clamped_to_effective_is_noop() {
        let mut timers = ManualTimers::new();
        let mut setting: RangeSetting<i32> = Setting::new(Bounds::new(5, 50), 50);
        let mut session = ChangeSession::new(ComponentKind::Geofence, &mut timers);
        let mut calls = 0;

        assert!(!setting.request_change(80, |_| { calls += 1; true }, &mut session));
        assert_eq!(calls, 0);
    }

    #[test]
    fn test_new_constraint_reconciles_confirmed() {
        let mut timers = ManualTimers::new();
        let mut setting: RangeSetting<i32> = Setting::new(Bounds::new(0, 100), 80);
        let mut session = ChangeSession::new(ComponentKind::Geofence, &mut timers);

        assert!(setting.set_constraint(Bounds::new(0, 60), &mut session));
        assert_eq!(*setting.confirmed(), 60);
        assert!(!setting.set_constraint(Bounds::new(0, 60), &mut session));
    }

    #[test]
    fn test_redeclared_set_drops_previous_value() {
        let mut timers = ManualTimers::new();
        let mut setting: EnumSetting<u16> = Setting::new(DiscreteSet::default(), 0);
        let mut session = ChangeSession::new(ComponentKind::WifiAccessPoint, &mut timers);

        assert!(setting.confirm_with(DiscreteSet::new([1, 6, 11]), 6, &mut session));
        assert!(!setting.constraint().contains(&0));

        assert!(setting.confirm_with(DiscreteSet::new([36, 40]), 36, &mut session));
        assert_eq!(setting.constraint().iter().copied().collect::<Vec<_>>(), vec![36, 40]);

        let mut calls = 0;
        assert!(!setting.request_change(6, |_| { calls += 1; true }, &mut session));
        assert_eq!(calls, 0);
        assert_eq!(*setting.value(), 36);
    }

    #[test]
    fn test_set_constraint_keeps_discrete_set_as_declared() {
        let mut timers = ManualTimers::new();
        let mut setting = flicker_setting();
        let mut session = ChangeSession::new(ComponentKind::AntiFlicker, &mut timers);

        assert!(setting.set_constraint(DiscreteSet::new([Flicker::Hz60, Flicker::Auto]), &mut session));
        assert!(!setting.constraint().contains(&Flicker::Hz50));
        assert_eq!(*setting.confirmed(), Flicker::Hz60);

        let mut calls = 0;
        assert!(!setting.request_change(Flicker::Hz50, |_| { calls += 1; true }, &mut session));
        assert_eq!(calls, 0);
    }

    #[test]
    fn test_unconstrained_default_setting() {
        let mut timers = ManualTimers::new();
        let mut setting = ToggleSetting::default();
        let mut session = ChangeSession::new(ComponentKind::Leds, &mut timers);
        assert!(setting.request_change(true, |_| true, &mut session));
        assert!(*setting.value());
    }

    #[test]
    fn test_fresh_range_setting_is_not_settable() {
        let mut timers = ManualTimers::new();
        let mut setting: RangeSetting<u32> = RangeSetting::default();
        let mut session = ChangeSession::new(ComponentKind::Geofence, &mut timers);
        assert!(!setting.is_settable());
        assert!(!setting.request_change(10, |_| true, &mut session));
    }
}

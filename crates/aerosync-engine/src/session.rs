//! Change sessions and dirty tracking.
//!
//! A [`ChangeSession`] is opened on one component for the duration of a
//! sequence of field updates. Each update marks the session dirty only when it
//! changed something a subscriber can observe. The registry folds the session
//! into the component's dirty flag and a later
//! [`commit`](crate::ComponentRegistry::commit) turns it into at most one
//! notification, however many fields were touched.

use std::time::Duration;

use crate::kind::ComponentKind;
use crate::timer::{TimerHandle, TimerService};

/// Mutation context for a single component.
pub struct ChangeSession<'a> {
    kind: ComponentKind,
    dirty: bool,
    timers: &'a mut dyn TimerService,
}

impl<'a> ChangeSession<'a> {
    /// Open a session on the component of `kind`, arming deadlines on `timers`.
    pub fn new(kind: ComponentKind, timers: &'a mut dyn TimerService) -> Self {
        Self {
            kind,
            dirty: false,
            timers,
        }
    }

    /// Kind of the component being mutated.
    #[must_use]
    pub fn kind(&self) -> ComponentKind {
        self.kind
    }

    /// Record that an externally observable value changed.
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Whether any update in this session changed an observable value.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Update a plain, unsynchronized attribute.
    ///
    /// Returns `true` and marks the session dirty when the value changed.
    pub fn update<T: PartialEq>(&mut self, field: &mut T, value: T) -> bool {
        if *field == value {
            return false;
        }
        *field = value;
        self.dirty = true;
        true
    }

    pub(crate) fn arm_deadline(&mut self, duration: Duration) -> TimerHandle {
        self.timers.arm(self.kind, duration)
    }

    pub(crate) fn cancel_deadline(&mut self, handle: TimerHandle) {
        self.timers.cancel(handle);
    }

    /// Close the session and return its dirty flag.
    #[must_use]
    pub fn finish(self) -> bool {
        self.dirty
    }
}

impl std::fmt::Debug for ChangeSession<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangeSession")
            .field("kind", &self.kind)
            .field("dirty", &self.dirty)
            .finish_non_exhaustive()
    }
}

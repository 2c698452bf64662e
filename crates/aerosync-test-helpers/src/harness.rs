//! Registry on a manual clock.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use aerosync_engine::prelude::*;

/// Counts the notifications delivered for one component kind.
///
/// The subscription lives as long as the counter.
#[derive(Debug)]
pub struct NotificationCounter {
    count: Arc<AtomicUsize>,
    subscription: Subscription,
}

impl NotificationCounter {
    /// Subscribe to `kind` on `registry`.
    pub fn subscribe(registry: &ComponentRegistry, kind: ComponentKind) -> Self {
        let count = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&count);
        let subscription = registry.subscribe(kind, move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
        });
        Self {
            count,
            subscription,
        }
    }

    /// Notifications received so far.
    pub fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }

    /// Return the count and reset it to zero.
    pub fn take(&self) -> usize {
        self.count.swap(0, Ordering::SeqCst)
    }

    /// Kind being counted.
    pub fn kind(&self) -> ComponentKind {
        self.subscription.kind()
    }
}

/// A [`ComponentRegistry`] driven by [`ManualTimers`].
///
/// ```rust
/// use aerosync_engine::prelude::*;
/// use aerosync_test_helpers::harness::ManualHarness;
///
/// let harness = ManualHarness::new();
/// assert!(harness.registry.is_empty());
/// ```
#[derive(Debug, Default)]
pub struct ManualHarness {
    /// Virtual clock arming setting deadlines.
    pub timers: ManualTimers,
    /// Registry under test.
    pub registry: ComponentRegistry,
}

impl ManualHarness {
    /// Create an empty harness at virtual time zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish `component` and start counting its notifications.
    pub fn publish(&mut self, component: impl Component) -> NotificationCounter {
        let kind = component.kind();
        self.registry.publish(Box::new(component));
        NotificationCounter::subscribe(&self.registry, kind)
    }

    /// Run a mutation session on the component of `kind` and commit it.
    ///
    /// # Errors
    ///
    /// See [`ComponentRegistry::update`].
    pub fn update<C: Component, R>(
        &mut self,
        kind: ComponentKind,
        f: impl FnOnce(&mut C, &mut ChangeSession<'_>) -> R,
    ) -> SyncResult<R> {
        self.registry.update(kind, &mut self.timers, f)
    }

    /// Borrow the published component of `kind` as a `C`.
    pub fn get<C: Component>(&self, kind: ComponentKind) -> Option<&C> {
        self.registry.get_as::<C>(kind)
    }

    /// Run the rollback coordinator on `kind`.
    ///
    /// # Errors
    ///
    /// See [`ComponentRegistry::cancel_all_pending`].
    pub fn cancel_all_pending(&mut self, kind: ComponentKind) -> SyncResult<usize> {
        self.registry.cancel_all_pending(kind, &mut self.timers)
    }

    /// Move the clock forward and deliver every expired deadline.
    ///
    /// Returns the number of settings that rolled back.
    pub fn advance(&mut self, by: Duration) -> usize {
        let fired = self.timers.advance(by);
        fired
            .into_iter()
            .filter(|fired| self.registry.fire_timer(*fired, &mut self.timers))
            .count()
    }
}

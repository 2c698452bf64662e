//! Kind-scoped subscriptions.
//!
//! A [`Subscription`] is returned by
//! [`ComponentRegistry::subscribe`](crate::ComponentRegistry::subscribe) and
//! stays registered for as long as it is alive. Dropping it deregisters the
//! listener; no notification is delivered to it afterwards, even one that is
//! already being dispatched.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use crate::component::Component;
use crate::kind::ComponentKind;
use crate::resource::ResourceGuard;

/// Callback invoked with the component after each notifying commit.
pub type Listener = dyn Fn(&dyn Component) + Send + Sync;

pub(crate) struct Slot {
    id: u64,
    active: AtomicBool,
    listener: Box<Listener>,
}

impl Slot {
    pub(crate) fn notify(&self, component: &dyn Component) -> bool {
        if !self.active.load(Ordering::Acquire) {
            return false;
        }
        (self.listener)(component);
        true
    }
}

#[derive(Default)]
pub(crate) struct SubscriberTable {
    next_id: u64,
    slots: HashMap<ComponentKind, Vec<Arc<Slot>>>,
}

impl SubscriberTable {
    pub(crate) fn insert(&mut self, kind: ComponentKind, listener: Box<Listener>) -> Arc<Slot> {
        self.next_id = self.next_id.wrapping_add(1);
        let slot = Arc::new(Slot {
            id: self.next_id,
            active: AtomicBool::new(true),
            listener,
        });
        self.slots.entry(kind).or_default().push(Arc::clone(&slot));
        slot
    }

    fn remove(&mut self, kind: ComponentKind, id: u64) {
        if let Some(slots) = self.slots.get_mut(&kind) {
            slots.retain(|slot| slot.id != id);
            if slots.is_empty() {
                self.slots.remove(&kind);
            }
        }
    }

    /// Listeners of `kind`, cloned so they can be invoked without holding the lock.
    pub(crate) fn snapshot(&self, kind: ComponentKind) -> Vec<Arc<Slot>> {
        self.slots.get(&kind).cloned().unwrap_or_default()
    }

    pub(crate) fn count(&self, kind: ComponentKind) -> usize {
        self.slots.get(&kind).map_or(0, Vec::len)
    }
}

/// Registration of a listener on a component kind.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    kind: ComponentKind,
    slot: Arc<Slot>,
    table: Weak<Mutex<SubscriberTable>>,
    resource: Option<ResourceGuard>,
}

impl Subscription {
    pub(crate) fn new(
        kind: ComponentKind,
        slot: Arc<Slot>,
        table: &Arc<Mutex<SubscriberTable>>,
        resource: Option<ResourceGuard>,
    ) -> Self {
        Self {
            kind,
            slot,
            table: Arc::downgrade(table),
            resource,
        }
    }

    /// Kind this subscription listens to.
    #[must_use]
    pub fn kind(&self) -> ComponentKind {
        self.kind
    }

    /// Whether a live resource is held by this subscription.
    #[must_use]
    pub fn holds_resource(&self) -> bool {
        self.resource.is_some()
    }

    /// Deregister explicitly. Equivalent to dropping the handle.
    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.slot.active.store(false, Ordering::Release);
        if let Some(table) = self.table.upgrade() {
            table.lock().remove(self.kind, self.slot.id);
        }
        tracing::trace!(kind = %self.kind, id = self.slot.id, "Subscription dropped");
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("kind", &self.kind)
            .field("id", &self.slot.id)
            .field("resource", &self.resource)
            .finish()
    }
}

//! The component registry.
//!
//! One [`ComponentRegistry`] exists per device session. It holds at most one
//! published component per [`ComponentKind`], the dirty flag of each, and the
//! kind-scoped subscriber lists. Mutations go through a
//! [`ChangeSession`] opened by [`ComponentRegistry::edit`]; the session's dirty
//! flag is folded into the component's, and
//! [`ComponentRegistry::commit`] turns it into at most one notification per
//! subscriber.
//!
//! Listeners receive a shared reference to the component while the registry
//! is exclusively borrowed for the commit, so they cannot mutate the
//! component or re-enter `commit`. Follow-up work a listener wants to do is
//! posted to the device session mailbox and runs after the commit returns.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::component::Component;
use crate::error::{SyncError, SyncResult};
use crate::kind::ComponentKind;
use crate::resource::ResourceGuard;
use crate::rollback;
use crate::session::ChangeSession;
use crate::subscription::{SubscriberTable, Subscription};
use crate::timer::{TimerFired, TimerService};

struct Entry {
    component: Box<dyn Component>,
    dirty: bool,
}

/// Keyed store of published components and their subscribers.
pub struct ComponentRegistry {
    entries: HashMap<ComponentKind, Entry>,
    subscribers: Arc<Mutex<SubscriberTable>>,
}

impl ComponentRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            subscribers: Arc::new(Mutex::new(SubscriberTable::default())),
        }
    }

    /// Publish a component under its kind, replacing any previous occupant.
    ///
    /// Existing subscriptions are kept; they fire on the next notifying
    /// commit of the new instance. Publishing does not notify by itself.
    /// Returns the replaced component.
    pub fn publish(&mut self, component: Box<dyn Component>) -> Option<Box<dyn Component>> {
        let kind = component.kind();
        tracing::info!(%kind, "Component published");
        self.entries
            .insert(
                kind,
                Entry {
                    component,
                    dirty: false,
                },
            )
            .map(|previous| previous.component)
    }

    /// Publish a component, failing if its kind is already occupied.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::AlreadyPublished`] if a component of the same
    /// kind is published.
    pub fn try_publish(&mut self, component: Box<dyn Component>) -> SyncResult<()> {
        let kind = component.kind();
        if self.entries.contains_key(&kind) {
            return Err(SyncError::already_published(kind));
        }
        self.publish(component);
        Ok(())
    }

    /// Remove the component of `kind` without notifying anyone.
    ///
    /// Outstanding deadlines of its settings are cancelled. Subscriptions stay
    /// registered for a later publication.
    pub fn unpublish(
        &mut self,
        kind: ComponentKind,
        timers: &mut dyn TimerService,
    ) -> Option<Box<dyn Component>> {
        let mut entry = self.entries.remove(&kind)?;
        let mut session = ChangeSession::new(kind, timers);
        entry
            .component
            .for_each_setting(&mut |setting| setting.discard_pending(&mut session));
        tracing::info!(%kind, "Component unpublished");
        Some(entry.component)
    }

    /// Snapshot read of the component of `kind`.
    #[must_use]
    pub fn get(&self, kind: ComponentKind) -> Option<&dyn Component> {
        self.entries.get(&kind).map(|entry| &*entry.component)
    }

    /// Typed snapshot read of the component of `kind`.
    ///
    /// Returns `None` if nothing is published or the type does not match.
    #[must_use]
    pub fn get_as<C: Component>(&self, kind: ComponentKind) -> Option<&C> {
        let component = self.get(kind)?;
        component.as_any().downcast_ref::<C>()
    }

    /// Whether a component of `kind` is published.
    #[must_use]
    pub fn is_published(&self, kind: ComponentKind) -> bool {
        self.entries.contains_key(&kind)
    }

    /// Kinds currently published.
    pub fn kinds(&self) -> impl Iterator<Item = ComponentKind> + '_ {
        self.entries.keys().copied()
    }

    /// Number of published components.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no component is published.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether the component of `kind` has uncommitted changes.
    #[must_use]
    pub fn is_dirty(&self, kind: ComponentKind) -> bool {
        self.entries.get(&kind).is_some_and(|entry| entry.dirty)
    }

    /// Register `listener` for every future notifying commit of `kind`.
    pub fn subscribe(
        &self,
        kind: ComponentKind,
        listener: impl Fn(&dyn Component) + Send + Sync + 'static,
    ) -> Subscription {
        self.register(kind, Box::new(listener), None)
    }

    /// Register `listener` and tie `resource` to the subscription, so the
    /// resource is released when the subscription is dropped.
    pub fn subscribe_with_resource(
        &self,
        kind: ComponentKind,
        listener: impl Fn(&dyn Component) + Send + Sync + 'static,
        resource: ResourceGuard,
    ) -> Subscription {
        self.register(kind, Box::new(listener), Some(resource))
    }

    fn register(
        &self,
        kind: ComponentKind,
        listener: Box<crate::subscription::Listener>,
        resource: Option<ResourceGuard>,
    ) -> Subscription {
        let slot = self.subscribers.lock().insert(kind, listener);
        tracing::debug!(%kind, "Subscription registered");
        Subscription::new(kind, slot, &self.subscribers, resource)
    }

    /// Number of live subscriptions on `kind`.
    #[must_use]
    pub fn subscriber_count(&self, kind: ComponentKind) -> usize {
        self.subscribers.lock().count(kind)
    }

    /// Run a mutation session on the type-erased component of `kind`.
    ///
    /// The session's dirty flag is folded into the component's; nothing is
    /// notified until [`commit`](Self::commit).
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::ComponentNotPublished`] if nothing is published
    /// under `kind`.
    pub fn edit_dyn<R>(
        &mut self,
        kind: ComponentKind,
        timers: &mut dyn TimerService,
        f: impl FnOnce(&mut dyn Component, &mut ChangeSession<'_>) -> R,
    ) -> SyncResult<R> {
        let entry = self
            .entries
            .get_mut(&kind)
            .ok_or_else(|| SyncError::not_published(kind))?;
        let mut session = ChangeSession::new(kind, timers);
        let result = f(&mut *entry.component, &mut session);
        entry.dirty |= session.finish();
        Ok(result)
    }

    /// Run a mutation session on the component of `kind` as its concrete type.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::ComponentNotPublished`] if nothing is published
    /// under `kind` and [`SyncError::ComponentTypeMismatch`] if the published
    /// component is not a `C`.
    pub fn edit<C: Component, R>(
        &mut self,
        kind: ComponentKind,
        timers: &mut dyn TimerService,
        f: impl FnOnce(&mut C, &mut ChangeSession<'_>) -> R,
    ) -> SyncResult<R> {
        let entry = self
            .entries
            .get_mut(&kind)
            .ok_or_else(|| SyncError::not_published(kind))?;
        let component: &mut dyn Component = &mut *entry.component;
        let typed = component
            .as_any_mut()
            .downcast_mut::<C>()
            .ok_or_else(|| SyncError::type_mismatch::<C>(kind))?;
        let mut session = ChangeSession::new(kind, timers);
        let result = f(typed, &mut session);
        entry.dirty |= session.finish();
        Ok(result)
    }

    /// [`edit`](Self::edit) followed by [`commit`](Self::commit).
    ///
    /// # Errors
    ///
    /// See [`edit`](Self::edit).
    pub fn update<C: Component, R>(
        &mut self,
        kind: ComponentKind,
        timers: &mut dyn TimerService,
        f: impl FnOnce(&mut C, &mut ChangeSession<'_>) -> R,
    ) -> SyncResult<R> {
        let result = self.edit(kind, timers, f)?;
        self.commit(kind)?;
        Ok(result)
    }

    /// Mark the component of `kind` dirty without touching any field.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::ComponentNotPublished`] if nothing is published
    /// under `kind`.
    pub fn mark_dirty(&mut self, kind: ComponentKind) -> SyncResult<()> {
        let entry = self
            .entries
            .get_mut(&kind)
            .ok_or_else(|| SyncError::not_published(kind))?;
        entry.dirty = true;
        Ok(())
    }

    /// Notify every subscriber of `kind` once if the component is dirty, then
    /// clear the flag. Returns whether a notification was delivered.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::ComponentNotPublished`] if nothing is published
    /// under `kind`.
    pub fn commit(&mut self, kind: ComponentKind) -> SyncResult<bool> {
        let entry = self
            .entries
            .get_mut(&kind)
            .ok_or_else(|| SyncError::not_published(kind))?;
        if !entry.dirty {
            return Ok(false);
        }
        entry.dirty = false;

        let listeners = self.subscribers.lock().snapshot(kind);
        let component: &dyn Component = &*entry.component;
        let mut delivered = 0usize;
        for slot in &listeners {
            if slot.notify(component) {
                delivered = delivered.saturating_add(1);
            }
        }
        tracing::debug!(%kind, delivered, "Component change committed");
        Ok(true)
    }

    /// Run the rollback coordinator on the component of `kind` and commit.
    ///
    /// Returns the number of settings promoted.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::ComponentNotPublished`] if nothing is published
    /// under `kind`.
    pub fn cancel_all_pending(
        &mut self,
        kind: ComponentKind,
        timers: &mut dyn TimerService,
    ) -> SyncResult<usize> {
        let promoted = self.edit_dyn(kind, timers, rollback::cancel_all_pending)?;
        self.commit(kind)?;
        Ok(promoted)
    }

    /// Run the rollback coordinator on every published component.
    ///
    /// Returns the total number of settings promoted.
    pub fn cancel_all_pending_everywhere(&mut self, timers: &mut dyn TimerService) -> usize {
        let kinds: Vec<ComponentKind> = self.kinds().collect();
        let mut promoted = 0usize;
        for kind in kinds {
            match self.cancel_all_pending(kind, timers) {
                Ok(count) => promoted = promoted.saturating_add(count),
                Err(err) => tracing::warn!(%kind, %err, "Rollback coordinator skipped component"),
            }
        }
        promoted
    }

    /// Deliver a deadline firing and commit the component it belongs to.
    ///
    /// Returns `true` when a setting rolled back. Firings for unpublished
    /// kinds or stale handles are ignored.
    pub fn fire_timer(&mut self, fired: TimerFired, timers: &mut dyn TimerService) -> bool {
        let rolled_back = match self.edit_dyn(fired.kind, timers, |component, session| {
            rollback::route_timeout(component, fired.handle, session)
        }) {
            Ok(rolled_back) => rolled_back,
            Err(_) => {
                tracing::trace!(kind = %fired.kind, handle = %fired.handle, "Deadline for unpublished component");
                return false;
            }
        };

        if rolled_back && let Err(err) = self.commit(fired.kind) {
            tracing::warn!(kind = %fired.kind, %err, "Commit after timeout failed");
        }
        rolled_back
    }
}

impl Default for ComponentRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ComponentRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut kinds: Vec<ComponentKind> = self.kinds().collect();
        kinds.sort();
        f.debug_struct("ComponentRegistry")
            .field("published", &kinds)
            .finish_non_exhaustive()
    }
}

//! Settings indexed by a secondary key.
//!
//! Peripherals such as a gimbal (one speed setting per axis) or a debug
//! component (one value per item id) hold a [`SettingMap`]. The map tracks
//! the set of keys the device currently supports and never holds an entry
//! outside it: shrinking the supported set discards the entries of dropped
//! keys in the same session, so subscribers observe the key-set change and
//! the prune as one commit. A key that is dropped and later re-added starts
//! empty until the device reports a value for it again.

use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Debug;

use crate::constraint::Constraint;
use crate::session::ChangeSession;
use crate::setting::{Setting, SettingControl, SettingValue};

/// Collection whose domain must follow the component's supported keys.
pub trait KeyedCollection<K> {
    /// Restrict the collection to `keys`. Returns whether anything changed.
    fn retain_keys(&mut self, keys: &BTreeSet<K>, session: &mut ChangeSession<'_>) -> bool;
}

/// Apply a new supported-key set to every keyed collection of a component.
///
/// Returns whether any collection changed.
pub fn set_supported_keys<K: Ord>(
    keys: impl IntoIterator<Item = K>,
    collections: &mut [&mut dyn KeyedCollection<K>],
    session: &mut ChangeSession<'_>,
) -> bool {
    let keys: BTreeSet<K> = keys.into_iter().collect();
    let mut changed = false;
    for collection in collections.iter_mut() {
        changed |= collection.retain_keys(&keys, session);
    }
    changed
}

/// Map of settings keyed by `K`.
#[derive(Debug, Clone)]
pub struct SettingMap<K, T, C> {
    supported: BTreeSet<K>,
    entries: BTreeMap<K, Setting<T, C>>,
}

impl<K, T, C> Default for SettingMap<K, T, C> {
    fn default() -> Self {
        Self {
            supported: BTreeSet::new(),
            entries: BTreeMap::new(),
        }
    }
}

impl<K, T, C> SettingMap<K, T, C>
where
    K: Ord + Clone + Debug,
    T: SettingValue,
    C: Constraint<T>,
{
    /// Create an empty map with no supported keys.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Keys the device currently supports.
    pub fn supported_keys(&self) -> &BTreeSet<K> {
        &self.supported
    }

    /// Whether `key` is currently supported.
    pub fn is_supported(&self, key: &K) -> bool {
        self.supported.contains(key)
    }

    /// Setting for `key`, or `None` if the key is unsupported or no value has
    /// been received for it since it became supported.
    pub fn get(&self, key: &K) -> Option<&Setting<T, C>> {
        if !self.supported.contains(key) {
            return None;
        }
        self.entries.get(key)
    }

    /// Effective value for `key`.
    pub fn value(&self, key: &K) -> Option<&T> {
        self.get(key).map(Setting::value)
    }

    /// Iterate over the entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &Setting<T, C>)> {
        self.entries.iter()
    }

    /// Number of entries holding a value.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no entry holds a value.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether any entry has an outstanding change.
    pub fn any_updating(&self) -> bool {
        self.entries.values().any(Setting::is_updating)
    }

    /// Replace the supported-key set, discarding entries of dropped keys.
    ///
    /// Returns whether the key set changed.
    pub fn set_supported_keys(
        &mut self,
        keys: impl IntoIterator<Item = K>,
        session: &mut ChangeSession<'_>,
    ) -> bool {
        let keys: BTreeSet<K> = keys.into_iter().collect();
        self.retain_keys(&keys, session)
    }

    /// Request a new value for `key`. See [`Setting::request_change`].
    ///
    /// Requests for unsupported keys or keys without a value are rejected
    /// without calling the backend.
    pub fn request_change(
        &mut self,
        key: &K,
        value: T,
        try_set: impl FnOnce(&T) -> bool,
        session: &mut ChangeSession<'_>,
    ) -> bool {
        if !self.supported.contains(key) {
            tracing::trace!(kind = %session.kind(), ?key, "Request for unsupported key");
            return false;
        }
        match self.entries.get_mut(key) {
            Some(setting) => setting.request_change(value, try_set, session),
            None => {
                tracing::trace!(kind = %session.kind(), ?key, "Request for key without a value");
                false
            }
        }
    }

    /// Apply a device report for `key`. Reports for unsupported keys are
    /// ignored; the first report for a supported key creates its entry with
    /// `C::default()`.
    ///
    /// For [`Bounds`](crate::constraint::Bounds) the default declares no
    /// range, so an entry created here is not settable until its limits
    /// arrive through [`confirm_with`](Self::confirm_with) or
    /// [`set_constraint`](Self::set_constraint).
    ///
    /// Returns whether anything observable changed.
    pub fn confirm(&mut self, key: K, value: T, session: &mut ChangeSession<'_>) -> bool
    where
        C: PartialEq + Default,
    {
        self.confirm_entry(key, None, value, session)
    }

    /// Apply a device report declaring both the constraint and the value for
    /// `key`. See [`Setting::confirm_with`].
    pub fn confirm_with(
        &mut self,
        key: K,
        constraint: C,
        value: T,
        session: &mut ChangeSession<'_>,
    ) -> bool
    where
        C: PartialEq + Default,
    {
        self.confirm_entry(key, Some(constraint), value, session)
    }

    fn confirm_entry(
        &mut self,
        key: K,
        constraint: Option<C>,
        value: T,
        session: &mut ChangeSession<'_>,
    ) -> bool
    where
        C: PartialEq + Default,
    {
        if !self.supported.contains(&key) {
            tracing::trace!(kind = %session.kind(), ?key, "Ignoring report for unsupported key");
            return false;
        }
        match self.entries.entry(key) {
            Entry::Occupied(entry) => {
                let setting = entry.into_mut();
                match constraint {
                    Some(constraint) => setting.confirm_with(constraint, value, session),
                    None => setting.confirm(value, session),
                }
            }
            Entry::Vacant(entry) => {
                tracing::debug!(kind = %session.kind(), key = ?entry.key(), "Keyed setting received");
                entry.insert(Setting::new(constraint.unwrap_or_default(), value));
                session.mark_dirty();
                true
            }
        }
    }

    /// Replace the constraint of the entry for `key`. See
    /// [`Setting::set_constraint`].
    ///
    /// Returns `false` when the key is unsupported or holds no value.
    pub fn set_constraint(&mut self, key: &K, constraint: C, session: &mut ChangeSession<'_>) -> bool
    where
        C: PartialEq,
    {
        if !self.supported.contains(key) {
            return false;
        }
        match self.entries.get_mut(key) {
            Some(setting) => setting.set_constraint(constraint, session),
            None => false,
        }
    }

    /// Visit every entry as a type-erased setting.
    pub fn for_each_setting(&mut self, visit: &mut dyn FnMut(&mut dyn SettingControl)) {
        for setting in self.entries.values_mut() {
            visit(setting);
        }
    }
}

impl<K, T, C> KeyedCollection<K> for SettingMap<K, T, C>
where
    K: Ord + Clone + Debug,
    T: SettingValue,
    C: Constraint<T>,
{
    fn retain_keys(&mut self, keys: &BTreeSet<K>, session: &mut ChangeSession<'_>) -> bool {
        if self.supported == *keys {
            return false;
        }

        let dropped: Vec<K> = self
            .entries
            .keys()
            .filter(|key| !keys.contains(*key))
            .cloned()
            .collect();
        for key in &dropped {
            if let Some(mut setting) = self.entries.remove(key) {
                setting.discard_pending(session);
            }
        }

        tracing::debug!(
            kind = %session.kind(),
            supported = keys.len(),
            pruned = dropped.len(),
            "Supported keys changed"
        );
        self.supported.clone_from(keys);
        session.mark_dirty();
        true
    }
}

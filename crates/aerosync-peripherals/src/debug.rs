//! Vendor debug settings.
//!
//! The device publishes a list of numeric debug items identified by id. The
//! list can change at any time; values are only kept for ids in the latest
//! list.

use std::collections::BTreeMap;

use aerosync_engine::prelude::*;
use serde::{Deserialize, Serialize};

/// Description of one debug item as listed by the device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebugItem {
    /// Item id.
    pub id: u16,
    /// Display name.
    pub name: String,
    /// Inclusive value range.
    pub range: (f64, f64),
    /// Whether the application may change the value.
    pub read_only: bool,
}

/// Command writing one debug item.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DebugCommand {
    /// Item id.
    pub id: u16,
    /// New value.
    pub value: f64,
}

/// The debug settings peripheral.
pub struct DebugSettings {
    backend: Box<dyn Backend<DebugCommand>>,
    items: BTreeMap<u16, DebugItem>,
    values: SettingMap<u16, f64, Bounds<f64>>,
}

impl DebugSettings {
    /// Create an empty debug settings component.
    pub fn new(backend: impl Backend<DebugCommand> + 'static) -> Self {
        Self {
            backend: Box::new(backend),
            items: BTreeMap::new(),
            values: SettingMap::new(),
        }
    }

    /// Items currently listed by the device.
    pub fn items(&self) -> impl Iterator<Item = &DebugItem> {
        self.items.values()
    }

    /// Description of item `id`.
    pub fn item(&self, id: u16) -> Option<&DebugItem> {
        self.items.get(&id)
    }

    /// Current value of item `id`.
    pub fn value(&self, id: u16) -> Option<f64> {
        self.values.value(&id).copied()
    }

    /// Setting backing item `id`.
    pub fn setting(&self, id: u16) -> Option<&RangeSetting<f64>> {
        self.values.get(&id)
    }

    /// Request a value for item `id`. Read-only and unknown items are
    /// rejected without reaching the device.
    pub fn set_value(&mut self, id: u16, value: f64, session: &mut ChangeSession<'_>) -> bool {
        if self.items.get(&id).is_none_or(|item| item.read_only) {
            tracing::trace!(kind = %session.kind(), id, "Debug item is not writable");
            return false;
        }
        let backend = &mut self.backend;
        self.values.request_change(
            &id,
            value,
            |value| backend.submit(DebugCommand { id, value: *value }),
            session,
        )
    }

    /// Apply a new item list. Values of items no longer listed are dropped;
    /// items still listed take their new range at once.
    pub fn on_item_list(&mut self, items: Vec<DebugItem>, session: &mut ChangeSession<'_>) -> bool {
        let items: BTreeMap<u16, DebugItem> = items.into_iter().map(|item| (item.id, item)).collect();
        let pruned = self
            .values
            .set_supported_keys(items.keys().copied(), session);
        let mut ranged = false;
        for (id, item) in &items {
            if self.items.get(id).is_some_and(|old| old.range != item.range) {
                let (min, max) = item.range;
                ranged |= self.values.set_constraint(id, Bounds::new(min, max), session);
            }
        }
        let listed = session.update(&mut self.items, items);
        pruned || ranged || listed
    }

    /// Apply the current value of item `id`.
    pub fn on_value(&mut self, id: u16, value: f64, session: &mut ChangeSession<'_>) -> bool {
        let Some(item) = self.items.get(&id) else {
            tracing::trace!(kind = %session.kind(), id, "Value for unlisted debug item");
            return false;
        };
        let (min, max) = item.range;
        self.values
            .confirm_with(id, Bounds::new(min, max), value, session)
    }
}

impl Component for DebugSettings {
    fn kind(&self) -> ComponentKind {
        ComponentKind::DebugSettings
    }

    fn for_each_setting(&mut self, visit: &mut dyn FnMut(&mut dyn SettingControl)) {
        self.values.for_each_setting(visit);
    }
}

impl std::fmt::Debug for DebugSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DebugSettings")
            .field("items", &self.items)
            .field("values", &self.values)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aerosync_test_helpers::backend::CommandLog;

    fn item(id: u16, read_only: bool) -> DebugItem {
        DebugItem {
            read_only,
            ..ranged_item(id, (0.0, 10.0))
        }
    }

    fn ranged_item(id: u16, range: (f64, f64)) -> DebugItem {
        DebugItem {
            id,
            name: format!("item {id}"),
            range,
            read_only: false,
        }
    }

    #[test]
    fn test_read_only_item_is_not_writable() {
        let mut timers = ManualTimers::new();
        let mut debug = DebugSettings::new(|_command: DebugCommand| true);
        let mut session = ChangeSession::new(ComponentKind::DebugSettings, &mut timers);
        debug.on_item_list(vec![item(1, true), item(2, false)], &mut session);
        debug.on_value(1, 3.0, &mut session);
        debug.on_value(2, 3.0, &mut session);

        assert!(!debug.set_value(1, 4.0, &mut session));
        assert!(debug.set_value(2, 4.0, &mut session));
        assert!(!debug.set_value(9, 4.0, &mut session));
        assert_eq!(debug.value(1), Some(3.0));
        assert_eq!(debug.value(2), Some(4.0));
    }

    #[test]
    fn test_relisting_drops_values_of_removed_items() {
        let mut timers = ManualTimers::new();
        let mut debug = DebugSettings::new(Disconnected);
        let mut session = ChangeSession::new(ComponentKind::DebugSettings, &mut timers);
        debug.on_item_list(vec![item(1, false), item(2, false)], &mut session);
        debug.on_value(2, 7.0, &mut session);

        assert!(debug.on_item_list(vec![item(1, false)], &mut session));
        assert_eq!(debug.value(2), None);
        assert!(debug.item(2).is_none());

        debug.on_item_list(vec![item(1, false), item(2, false)], &mut session);
        assert_eq!(debug.value(2), None);
        assert!(!debug.on_value(3, 1.0, &mut session));
    }

    #[test]
    fn test_relisted_range_applies_to_existing_value() {
        let mut timers = ManualTimers::new();
        let log = CommandLog::new();
        let mut debug = DebugSettings::new(log.clone());
        let mut session = ChangeSession::new(ComponentKind::DebugSettings, &mut timers);
        debug.on_item_list(vec![ranged_item(1, (0.0, 10.0))], &mut session);
        debug.on_value(1, 5.0, &mut session);

        assert!(debug.on_item_list(vec![ranged_item(1, (0.0, 20.0))], &mut session));
        assert!(debug.set_value(1, 15.0, &mut session));
        assert_eq!(log.take(), vec![DebugCommand { id: 1, value: 15.0 }]);

        debug.on_item_list(vec![ranged_item(1, (0.0, 4.0))], &mut session);
        assert_eq!(debug.setting(1).map(|s| *s.confirmed()), Some(4.0));
    }
}

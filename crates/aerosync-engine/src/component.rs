//! The common shape of every published peripheral.

use std::any::Any;

use crate::kind::ComponentKind;
use crate::setting::SettingControl;

/// Upcast helper so registry entries can be downcast to their concrete type.
pub trait AsAny: Any {
    /// Borrow as `&dyn Any`.
    fn as_any(&self) -> &dyn Any;

    /// Borrow as `&mut dyn Any`.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// A peripheral capability hosted by the registry.
///
/// Implementors expose their kind and enumerate every synchronized setting
/// they own, including each entry of their keyed collections, so the engine
/// can route deadline firings and run the rollback coordinator without
/// knowing the concrete setting types.
pub trait Component: AsAny + Send {
    /// Kind this component is published under.
    fn kind(&self) -> ComponentKind;

    /// Visit every setting of the component.
    fn for_each_setting(&mut self, visit: &mut dyn FnMut(&mut dyn SettingControl));

    /// Number of settings with an outstanding change.
    fn pending_count(&mut self) -> usize {
        let mut count = 0usize;
        self.for_each_setting(&mut |setting| {
            if setting.is_updating() {
                count = count.saturating_add(1);
            }
        });
        count
    }
}

impl std::fmt::Debug for dyn Component {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Component")
            .field("kind", &self.kind())
            .finish_non_exhaustive()
    }
}

//! Prelude for aerosync-engine.
//!
//! Re-exports the types needed to define components and drive a registry.
//!
//! # Example
//!
//! ```rust
//! use aerosync_engine::prelude::*;
//!
//! let mut timers = ManualTimers::new();
//! let mut session = ChangeSession::new(ComponentKind::Gimbal, &mut timers);
//! let mut stabilized = ToggleSetting::default();
//! assert!(stabilized.confirm(true, &mut session));
//! assert!(session.finish());
//! ```

pub use crate::backend::{Backend, Disconnected};
pub use crate::component::Component;
pub use crate::config::{SessionConfig, SessionConfigBuilder};
pub use crate::constraint::{AnyValue, Bounds, Constraint, DiscreteSet};
pub use crate::device_session::{DeviceSession, SessionHandle};
pub use crate::error::{SyncError, SyncResult};
pub use crate::keyed::{KeyedCollection, SettingMap, set_supported_keys};
pub use crate::kind::ComponentKind;
pub use crate::registry::ComponentRegistry;
pub use crate::resource::{LiveResource, ResourceGuard};
pub use crate::rollback::{cancel_all_pending, route_timeout};
pub use crate::session::ChangeSession;
pub use crate::setting::{
    EnumSetting, RangeSetting, Setting, SettingControl, SettingValue, SyncState, ToggleSetting,
};
pub use crate::subscription::Subscription;
pub use crate::timer::{ManualTimers, TimerFired, TimerHandle, TimerService, TokioTimers};

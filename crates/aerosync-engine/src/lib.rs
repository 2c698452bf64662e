//! # aerosync-engine
//!
//! Setting synchronization and component registry for remote device
//! peripherals.
//!
//! A connected device exposes peripherals (camera, gimbal, geofence, ...) as
//! [`Component`]s. Each component owns typed [`Setting`]s that the
//! application may change optimistically: the requested value is shown at
//! once, pushed to the device through a backend adapter, and held pending
//! until the device confirms it. If no confirmation arrives within five
//! seconds the setting rolls back to the last confirmed value.
//!
//! ## Architecture
//!
//! - [`setting`] - the per-setting state machine (`Synced` / `Updating`)
//! - [`backend`] - the adapter pushing requested values to the device
//! - [`constraint`] - discrete sets, numeric ranges and unconstrained values
//! - [`keyed`] - settings indexed by a dynamically supported key set
//! - [`session`] - change sessions and dirty tracking
//! - [`rollback`] - the rollback coordinator and deadline routing
//! - [`registry`] - published components, commits and subscriptions
//! - [`subscription`] - RAII subscription handles
//! - [`resource`] - reference-counted live resources
//! - [`timer`] - deadline timers (tokio-backed and manual)
//! - [`device_session`] - the actor serializing all work for one device
//! - [`config`] - session configuration
//! - [`error`] - engine error types
//!
//! ## Notification semantics
//!
//! Any number of mutations made between two commits produce at most one
//! notification per subscriber, and a commit after mutations that changed
//! nothing observable produces none.
//!
//! ## Example
//!
//! ```rust
//! use aerosync_engine::prelude::*;
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use std::time::Duration;
//!
//! struct AntiFlicker {
//!     mode: EnumSetting<&'static str>,
//! }
//!
//! impl Component for AntiFlicker {
//!     fn kind(&self) -> ComponentKind {
//!         ComponentKind::AntiFlicker
//!     }
//!
//!     fn for_each_setting(&mut self, visit: &mut dyn FnMut(&mut dyn SettingControl)) {
//!         visit(&mut self.mode);
//!     }
//! }
//!
//! # fn main() -> Result<(), SyncError> {
//! let mut timers = ManualTimers::new();
//! let mut registry = ComponentRegistry::new();
//! registry.publish(Box::new(AntiFlicker {
//!     mode: Setting::new(DiscreteSet::new(["50Hz", "60Hz", "auto"]), "50Hz"),
//! }));
//!
//! let notifications = Arc::new(AtomicUsize::new(0));
//! let counter = Arc::clone(&notifications);
//! let _subscription = registry.subscribe(ComponentKind::AntiFlicker, move |_| {
//!     counter.fetch_add(1, Ordering::SeqCst);
//! });
//!
//! registry.update::<AntiFlicker, _>(ComponentKind::AntiFlicker, &mut timers, |c, s| {
//!     c.mode.request_change("60Hz", |_| true, s)
//! })?;
//!
//! // No confirmation: the change rolls back after five seconds.
//! for fired in timers.advance(Duration::from_secs(5)) {
//!     registry.fire_timer(fired, &mut timers);
//! }
//!
//! let current = registry.get_as::<AntiFlicker>(ComponentKind::AntiFlicker);
//! assert_eq!(current.map(|c| *c.mode.value()), Some("50Hz"));
//! assert_eq!(notifications.load(Ordering::SeqCst), 2);
//! # Ok(())
//! # }
//! ```

#![deny(
    unsafe_op_in_unsafe_fn,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic_in_result_fn,
    clippy::panic,
    missing_docs,
    missing_debug_implementations
)]
#![warn(clippy::pedantic)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod backend;
pub mod component;
pub mod config;
pub mod constraint;
pub mod device_session;
pub mod error;
pub mod keyed;
pub mod kind;
pub mod registry;
pub mod resource;
pub mod rollback;
pub mod session;
pub mod setting;
pub mod subscription;
pub mod timer;

pub mod prelude;

pub use backend::{Backend, Disconnected};
pub use component::{AsAny, Component};
pub use config::{SessionConfig, SessionConfigBuilder};
pub use constraint::{AnyValue, Bounds, Constraint, DiscreteSet};
pub use device_session::{DeviceSession, SessionCommand, SessionHandle, SessionJob};
pub use error::{SyncError, SyncResult};
pub use keyed::{KeyedCollection, SettingMap};
pub use kind::ComponentKind;
pub use registry::ComponentRegistry;
pub use resource::{LiveResource, ResourceGuard};
pub use session::ChangeSession;
pub use setting::{
    EnumSetting, RangeSetting, Setting, SettingControl, SettingValue, SyncState, ToggleSetting,
};
pub use subscription::{Listener, Subscription};
pub use timer::{ManualTimers, TimerFired, TimerHandle, TimerService, TokioTimers};

//! # aerosync-peripherals
//!
//! Reference peripherals built on [`aerosync_engine`].
//!
//! Each peripheral is a [`Component`](aerosync_engine::Component) owning its
//! synchronized settings and a [`Backend`](aerosync_engine::Backend) that
//! carries its commands to the device. Application requests go through the
//! `set_*` methods; device reports go through the `on_*` methods. Both take
//! the [`ChangeSession`](aerosync_engine::ChangeSession) opened by the
//! registry, so a whole device message lands in one commit.
//!
//! - [`camera`] - anti-flicker, capture configuration, exposure compensation
//! - [`gimbal`] - per-axis speed and stabilization
//! - [`geofence`] - altitude and distance limits
//! - [`wifi`] - access point channel and environment
//! - [`debug`] - vendor debug items keyed by id
//!
//! ## Example
//!
//! ```rust
//! use aerosync_engine::prelude::*;
//! use aerosync_peripherals::geofence::{Geofence, GeofenceCommand};
//!
//! # fn main() -> Result<(), SyncError> {
//! let mut timers = ManualTimers::new();
//! let mut registry = ComponentRegistry::new();
//! registry.publish(Box::new(Geofence::new(|_: GeofenceCommand| true)));
//!
//! registry.update::<Geofence, _>(ComponentKind::Geofence, &mut timers, |g, s| {
//!     g.on_max_altitude(5.0, 50.0, 30.0, s)
//! })?;
//! let accepted = registry.update::<Geofence, _>(ComponentKind::Geofence, &mut timers, |g, s| {
//!     g.set_max_altitude(66.0, s)
//! })?;
//! assert!(accepted);
//!
//! let geofence = registry.get_as::<Geofence>(ComponentKind::Geofence);
//! assert_eq!(geofence.map(|g| *g.max_altitude().value()), Some(50.0));
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_op_in_unsafe_fn)]
#![deny(clippy::unwrap_used, missing_docs, missing_debug_implementations)]

pub mod camera;
pub mod debug;
pub mod geofence;
pub mod gimbal;
pub mod wifi;

pub use camera::{AntiFlickerMode, Camera, CameraCommand, CameraMode, ConfigReport, Framerate, Resolution};
pub use debug::{DebugCommand, DebugItem, DebugSettings};
pub use geofence::{Geofence, GeofenceCommand, GeofenceMode};
pub use gimbal::{Axis, Gimbal, GimbalCommand};
pub use wifi::{Environment, WifiAccessPoint, WifiCommand};

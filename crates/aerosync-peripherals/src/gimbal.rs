//! Camera gimbal.
//!
//! Settings are per axis. The device declares which axes it drives; the
//! speed and stabilization collections follow that declaration together, so
//! an axis that disappears loses both its entries in the same commit.

use std::collections::BTreeSet;

use aerosync_engine::prelude::*;
use serde::{Deserialize, Serialize};

/// Gimbal axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Axis {
    /// Rotation around the vertical axis.
    Yaw,
    /// Rotation around the lateral axis.
    Pitch,
    /// Rotation around the longitudinal axis.
    Roll,
}

/// Commands sent to the gimbal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GimbalCommand {
    /// Change the maximum speed of an axis, in degrees per second.
    MaxSpeed {
        /// Target axis.
        axis: Axis,
        /// Speed in degrees per second.
        speed: f64,
    },
    /// Toggle stabilization of an axis.
    Stabilization {
        /// Target axis.
        axis: Axis,
        /// Whether the axis is stabilized.
        enabled: bool,
    },
}

/// The gimbal peripheral.
pub struct Gimbal {
    backend: Box<dyn Backend<GimbalCommand>>,
    max_speed: SettingMap<Axis, f64, Bounds<f64>>,
    stabilization: SettingMap<Axis, bool, AnyValue>,
}

impl Gimbal {
    /// Create a gimbal with no declared axes.
    pub fn new(backend: impl Backend<GimbalCommand> + 'static) -> Self {
        Self {
            backend: Box::new(backend),
            max_speed: SettingMap::new(),
            stabilization: SettingMap::new(),
        }
    }

    /// Axes the device currently drives.
    pub fn supported_axes(&self) -> &BTreeSet<Axis> {
        self.max_speed.supported_keys()
    }

    /// Per-axis maximum speed settings.
    pub fn max_speed(&self) -> &SettingMap<Axis, f64, Bounds<f64>> {
        &self.max_speed
    }

    /// Per-axis stabilization settings.
    pub fn stabilization(&self) -> &SettingMap<Axis, bool, AnyValue> {
        &self.stabilization
    }

    /// Request a maximum speed for `axis`. Out of range values are clamped.
    pub fn set_max_speed(&mut self, axis: Axis, speed: f64, session: &mut ChangeSession<'_>) -> bool {
        let backend = &mut self.backend;
        self.max_speed.request_change(
            &axis,
            speed,
            |speed| backend.submit(GimbalCommand::MaxSpeed { axis, speed: *speed }),
            session,
        )
    }

    /// Request stabilization on or off for `axis`.
    pub fn set_stabilization(
        &mut self,
        axis: Axis,
        enabled: bool,
        session: &mut ChangeSession<'_>,
    ) -> bool {
        let backend = &mut self.backend;
        self.stabilization.request_change(
            &axis,
            enabled,
            |enabled| backend.submit(GimbalCommand::Stabilization { axis, enabled: *enabled }),
            session,
        )
    }

    /// Apply the set of axes the device drives. Entries of axes no longer
    /// listed are discarded from both collections.
    pub fn on_supported_axes(
        &mut self,
        axes: impl IntoIterator<Item = Axis>,
        session: &mut ChangeSession<'_>,
    ) -> bool {
        let mut collections: [&mut dyn KeyedCollection<Axis>; 2] =
            [&mut self.max_speed, &mut self.stabilization];
        set_supported_keys(axes, &mut collections, session)
    }

    /// Apply the speed range and current maximum speed of `axis`.
    pub fn on_max_speed(
        &mut self,
        axis: Axis,
        min: f64,
        max: f64,
        current: f64,
        session: &mut ChangeSession<'_>,
    ) -> bool {
        self.max_speed
            .confirm_with(axis, Bounds::new(min, max), current, session)
    }

    /// Apply the current stabilization state of `axis`.
    pub fn on_stabilization(&mut self, axis: Axis, enabled: bool, session: &mut ChangeSession<'_>) -> bool {
        self.stabilization.confirm(axis, enabled, session)
    }
}

impl Component for Gimbal {
    fn kind(&self) -> ComponentKind {
        ComponentKind::Gimbal
    }

    fn for_each_setting(&mut self, visit: &mut dyn FnMut(&mut dyn SettingControl)) {
        self.max_speed.for_each_setting(visit);
        self.stabilization.for_each_setting(visit);
    }
}

impl std::fmt::Debug for Gimbal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gimbal")
            .field("max_speed", &self.max_speed)
            .field("stabilization", &self.stabilization)
            .finish_non_exhaustive()
    }
}

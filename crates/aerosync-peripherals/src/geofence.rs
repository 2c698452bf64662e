//! Geofence limits.

use aerosync_engine::prelude::*;
use serde::{Deserialize, Serialize};

/// Geofence enforcement mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GeofenceMode {
    /// Limits are not enforced.
    Disabled,
    /// Altitude and distance from home are enforced as a cylinder.
    Cylinder,
}

/// Commands sent to the geofence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GeofenceCommand {
    /// Change the maximum altitude, in meters.
    MaxAltitude(f64),
    /// Change the maximum distance from home, in meters.
    MaxDistance(f64),
    /// Change the enforcement mode.
    Mode(GeofenceMode),
}

/// Altitude and distance limits enforced by the device.
pub struct Geofence {
    backend: Box<dyn Backend<GeofenceCommand>>,
    max_altitude: RangeSetting<f64>,
    max_distance: RangeSetting<f64>,
    mode: EnumSetting<GeofenceMode>,
    center: Option<(f64, f64)>,
}

impl Geofence {
    /// Create a geofence with no declared limits.
    pub fn new(backend: impl Backend<GeofenceCommand> + 'static) -> Self {
        Self {
            backend: Box::new(backend),
            max_altitude: RangeSetting::default(),
            max_distance: RangeSetting::default(),
            mode: Setting::new(DiscreteSet::default(), GeofenceMode::Disabled),
            center: None,
        }
    }

    /// Maximum altitude setting, in meters.
    pub fn max_altitude(&self) -> &RangeSetting<f64> {
        &self.max_altitude
    }

    /// Maximum distance setting, in meters.
    pub fn max_distance(&self) -> &RangeSetting<f64> {
        &self.max_distance
    }

    /// Enforcement mode setting.
    pub fn mode(&self) -> &EnumSetting<GeofenceMode> {
        &self.mode
    }

    /// Latitude and longitude of the geofence center, once known.
    pub fn center(&self) -> Option<(f64, f64)> {
        self.center
    }

    /// Request a maximum altitude.
    pub fn set_max_altitude(&mut self, meters: f64, session: &mut ChangeSession<'_>) -> bool {
        let backend = &mut self.backend;
        self.max_altitude.request_change(
            meters,
            |meters| backend.submit(GeofenceCommand::MaxAltitude(*meters)),
            session,
        )
    }

    /// Request a maximum distance.
    pub fn set_max_distance(&mut self, meters: f64, session: &mut ChangeSession<'_>) -> bool {
        let backend = &mut self.backend;
        self.max_distance.request_change(
            meters,
            |meters| backend.submit(GeofenceCommand::MaxDistance(*meters)),
            session,
        )
    }

    /// Request an enforcement mode.
    pub fn set_mode(&mut self, mode: GeofenceMode, session: &mut ChangeSession<'_>) -> bool {
        let backend = &mut self.backend;
        self.mode.request_change(
            mode,
            |mode| backend.submit(GeofenceCommand::Mode(*mode)),
            session,
        )
    }

    /// Apply the altitude limits reported by the device.
    pub fn on_max_altitude(
        &mut self,
        min: f64,
        max: f64,
        current: f64,
        session: &mut ChangeSession<'_>,
    ) -> bool {
        self.max_altitude
            .confirm_with(Bounds::new(min, max), current, session)
    }

    /// Apply the distance limits reported by the device.
    pub fn on_max_distance(
        &mut self,
        min: f64,
        max: f64,
        current: f64,
        session: &mut ChangeSession<'_>,
    ) -> bool {
        self.max_distance
            .confirm_with(Bounds::new(min, max), current, session)
    }

    /// Apply the supported and current enforcement modes.
    pub fn on_mode(
        &mut self,
        supported: impl IntoIterator<Item = GeofenceMode>,
        current: GeofenceMode,
        session: &mut ChangeSession<'_>,
    ) -> bool {
        self.mode
            .confirm_with(DiscreteSet::new(supported), current, session)
    }

    /// Apply the geofence center.
    pub fn on_center(&mut self, center: Option<(f64, f64)>, session: &mut ChangeSession<'_>) -> bool {
        session.update(&mut self.center, center)
    }
}

impl Component for Geofence {
    fn kind(&self) -> ComponentKind {
        ComponentKind::Geofence
    }

    fn for_each_setting(&mut self, visit: &mut dyn FnMut(&mut dyn SettingControl)) {
        visit(&mut self.max_altitude);
        visit(&mut self.max_distance);
        visit(&mut self.mode);
    }
}

impl std::fmt::Debug for Geofence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Geofence")
            .field("max_altitude", &self.max_altitude)
            .field("max_distance", &self.max_distance)
            .field("mode", &self.mode)
            .field("center", &self.center)
            .finish_non_exhaustive()
    }
}

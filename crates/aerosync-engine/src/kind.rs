//! Component kinds.
//!
//! Every peripheral a device can expose is identified by one variant of the
//! closed [`ComponentKind`] enum. The registry holds at most one published
//! component per kind and subscriptions are scoped to kinds, not instances.

use serde::{Deserialize, Serialize};

/// Peripheral capability a remote device can expose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ComponentKind {
    /// Main imaging camera.
    Camera,
    /// Thermal imaging camera.
    ThermalCamera,
    /// Camera gimbal.
    Gimbal,
    /// Altitude and distance limits.
    Geofence,
    /// Wifi access point hosted by the device.
    WifiAccessPoint,
    /// Mains frequency compensation for the camera.
    AntiFlicker,
    /// Return-to-home behaviour.
    ReturnHome,
    /// Navigation and position lights.
    Leds,
    /// Magnetometer calibration.
    Magnetometer,
    /// Live video stream server.
    StreamServer,
    /// Onboard media storage.
    MediaStore,
    /// Firmware updater.
    FirmwareUpdater,
    /// Remote-control gamepad.
    Gamepad,
    /// Vendor debug settings keyed by item id.
    DebugSettings,
}

impl std::fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ComponentKind::Camera => write!(f, "Camera"),
            ComponentKind::ThermalCamera => write!(f, "Thermal Camera"),
            ComponentKind::Gimbal => write!(f, "Gimbal"),
            ComponentKind::Geofence => write!(f, "Geofence"),
            ComponentKind::WifiAccessPoint => write!(f, "Wifi Access Point"),
            ComponentKind::AntiFlicker => write!(f, "Anti-Flicker"),
            ComponentKind::ReturnHome => write!(f, "Return Home"),
            ComponentKind::Leds => write!(f, "LEDs"),
            ComponentKind::Magnetometer => write!(f, "Magnetometer"),
            ComponentKind::StreamServer => write!(f, "Stream Server"),
            ComponentKind::MediaStore => write!(f, "Media Store"),
            ComponentKind::FirmwareUpdater => write!(f, "Firmware Updater"),
            ComponentKind::Gamepad => write!(f, "Gamepad"),
            ComponentKind::DebugSettings => write!(f, "Debug Settings"),
        }
    }
}

impl ComponentKind {
    /// Get all component kinds as an iterator.
    pub fn all() -> impl Iterator<Item = Self> {
        [
            Self::Camera,
            Self::ThermalCamera,
            Self::Gimbal,
            Self::Geofence,
            Self::WifiAccessPoint,
            Self::AntiFlicker,
            Self::ReturnHome,
            Self::Leds,
            Self::Magnetometer,
            Self::StreamServer,
            Self::MediaStore,
            Self::FirmwareUpdater,
            Self::Gamepad,
            Self::DebugSettings,
        ]
        .into_iter()
    }
}

//! Wifi access point hosted by the device.

use aerosync_engine::prelude::*;
use serde::{Deserialize, Serialize};

/// Regulatory environment the access point operates in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Environment {
    /// Indoor channel set.
    Indoor,
    /// Outdoor channel set.
    Outdoor,
}

/// Commands sent to the access point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WifiCommand {
    /// Switch to a channel.
    Channel(u16),
    /// Switch regulatory environment.
    Environment(Environment),
}

/// The wifi access point peripheral.
pub struct WifiAccessPoint {
    backend: Box<dyn Backend<WifiCommand>>,
    ssid: String,
    channel: EnumSetting<u16>,
    environment: EnumSetting<Environment>,
}

impl WifiAccessPoint {
    /// Create an access point with no declared channels.
    pub fn new(backend: impl Backend<WifiCommand> + 'static) -> Self {
        Self {
            backend: Box::new(backend),
            ssid: String::new(),
            channel: EnumSetting::default(),
            environment: Setting::new(DiscreteSet::default(), Environment::Outdoor),
        }
    }

    /// Network name. Reported by the device only.
    pub fn ssid(&self) -> &str {
        &self.ssid
    }

    /// Channel setting.
    pub fn channel(&self) -> &EnumSetting<u16> {
        &self.channel
    }

    /// Environment setting.
    pub fn environment(&self) -> &EnumSetting<Environment> {
        &self.environment
    }

    /// Request a channel. Channels outside the available set are ignored.
    pub fn set_channel(&mut self, channel: u16, session: &mut ChangeSession<'_>) -> bool {
        let backend = &mut self.backend;
        self.channel.request_change(
            channel,
            |channel| backend.submit(WifiCommand::Channel(*channel)),
            session,
        )
    }

    /// Request a regulatory environment.
    pub fn set_environment(&mut self, environment: Environment, session: &mut ChangeSession<'_>) -> bool {
        let backend = &mut self.backend;
        self.environment.request_change(
            environment,
            |environment| backend.submit(WifiCommand::Environment(*environment)),
            session,
        )
    }

    /// Apply the available channels and the current one.
    pub fn on_channels(
        &mut self,
        available: impl IntoIterator<Item = u16>,
        current: u16,
        session: &mut ChangeSession<'_>,
    ) -> bool {
        self.channel
            .confirm_with(DiscreteSet::new(available), current, session)
    }

    /// Apply the supported environments and the current one.
    pub fn on_environment(
        &mut self,
        supported: impl IntoIterator<Item = Environment>,
        current: Environment,
        session: &mut ChangeSession<'_>,
    ) -> bool {
        self.environment
            .confirm_with(DiscreteSet::new(supported), current, session)
    }

    /// Apply the network name.
    pub fn on_ssid(&mut self, ssid: impl Into<String>, session: &mut ChangeSession<'_>) -> bool {
        session.update(&mut self.ssid, ssid.into())
    }
}

impl Component for WifiAccessPoint {
    fn kind(&self) -> ComponentKind {
        ComponentKind::WifiAccessPoint
    }

    fn for_each_setting(&mut self, visit: &mut dyn FnMut(&mut dyn SettingControl)) {
        visit(&mut self.channel);
        visit(&mut self.environment);
    }
}

impl std::fmt::Debug for WifiAccessPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WifiAccessPoint")
            .field("ssid", &self.ssid)
            .field("channel", &self.channel)
            .field("environment", &self.environment)
            .finish_non_exhaustive()
    }
}

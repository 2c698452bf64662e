//! Main camera.
//!
//! The camera's capture mode, resolution and framerate are declared and
//! changed together: the device reports them in one message and accepts one
//! configure command for all three. Anti-flicker and exposure compensation
//! are independent settings.

use aerosync_engine::prelude::*;
use serde::{Deserialize, Serialize};

/// Mains frequency compensation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AntiFlickerMode {
    /// No compensation.
    Off,
    /// Compensate for 50 Hz lighting.
    Hz50,
    /// Compensate for 60 Hz lighting.
    Hz60,
    /// Let the device detect the mains frequency.
    Auto,
}

/// Capture mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CameraMode {
    /// Still photos.
    Photo,
    /// Video recording.
    Recording,
}

/// Capture resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Resolution {
    /// 3840x2160.
    Uhd4k,
    /// 1920x1080.
    Fhd1080p,
    /// 1280x720.
    Hd720p,
}

/// Capture framerate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Framerate {
    /// 24 fps.
    Fps24,
    /// 30 fps.
    Fps30,
    /// 60 fps.
    Fps60,
}

/// Commands sent to the camera.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CameraCommand {
    /// Change anti-flicker mode.
    AntiFlicker(AntiFlickerMode),
    /// Change capture mode, resolution and framerate in one step.
    Configure {
        /// Capture mode.
        mode: CameraMode,
        /// Capture resolution.
        resolution: Resolution,
        /// Capture framerate.
        framerate: Framerate,
    },
    /// Change exposure compensation, in EV.
    ExposureCompensation(f32),
}

/// Capture configuration as reported by the device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigReport {
    /// Supported capture modes.
    pub modes: Vec<CameraMode>,
    /// Supported resolutions.
    pub resolutions: Vec<Resolution>,
    /// Supported framerates.
    pub framerates: Vec<Framerate>,
    /// Current capture mode.
    pub mode: CameraMode,
    /// Current resolution.
    pub resolution: Resolution,
    /// Current framerate.
    pub framerate: Framerate,
}

/// The main camera peripheral.
pub struct Camera {
    backend: Box<dyn Backend<CameraCommand>>,
    model: String,
    anti_flicker: EnumSetting<AntiFlickerMode>,
    mode: EnumSetting<CameraMode>,
    resolution: EnumSetting<Resolution>,
    framerate: EnumSetting<Framerate>,
    exposure_compensation: RangeSetting<f32>,
}

impl Camera {
    /// Create a camera with no declared capabilities.
    pub fn new(backend: impl Backend<CameraCommand> + 'static) -> Self {
        Self {
            backend: Box::new(backend),
            model: String::new(),
            anti_flicker: Setting::new(DiscreteSet::default(), AntiFlickerMode::Off),
            mode: Setting::new(DiscreteSet::default(), CameraMode::Photo),
            resolution: Setting::new(DiscreteSet::default(), Resolution::Fhd1080p),
            framerate: Setting::new(DiscreteSet::default(), Framerate::Fps30),
            exposure_compensation: RangeSetting::default(),
        }
    }

    /// Camera model name.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Anti-flicker setting.
    pub fn anti_flicker(&self) -> &EnumSetting<AntiFlickerMode> {
        &self.anti_flicker
    }

    /// Capture mode setting.
    pub fn mode(&self) -> &EnumSetting<CameraMode> {
        &self.mode
    }

    /// Resolution setting.
    pub fn resolution(&self) -> &EnumSetting<Resolution> {
        &self.resolution
    }

    /// Framerate setting.
    pub fn framerate(&self) -> &EnumSetting<Framerate> {
        &self.framerate
    }

    /// Exposure compensation setting, in EV.
    pub fn exposure_compensation(&self) -> &RangeSetting<f32> {
        &self.exposure_compensation
    }

    /// Request an anti-flicker mode.
    pub fn set_anti_flicker(&mut self, mode: AntiFlickerMode, session: &mut ChangeSession<'_>) -> bool {
        let backend = &mut self.backend;
        self.anti_flicker.request_change(
            mode,
            |mode| backend.submit(CameraCommand::AntiFlicker(*mode)),
            session,
        )
    }

    /// Request an exposure compensation. Out of range values are clamped.
    pub fn set_exposure_compensation(&mut self, ev: f32, session: &mut ChangeSession<'_>) -> bool {
        let backend = &mut self.backend;
        self.exposure_compensation.request_change(
            ev,
            |ev| backend.submit(CameraCommand::ExposureCompensation(*ev)),
            session,
        )
    }

    /// Request capture mode, resolution and framerate together.
    ///
    /// Either all three are admitted and sent as one command or nothing
    /// changes. Values that are already effective stay synced.
    pub fn configure(
        &mut self,
        mode: CameraMode,
        resolution: Resolution,
        framerate: Framerate,
        session: &mut ChangeSession<'_>,
    ) -> bool {
        let (Some(mode), Some(resolution), Some(framerate)) = (
            self.mode.constraint().admit(mode),
            self.resolution.constraint().admit(resolution),
            self.framerate.constraint().admit(framerate),
        ) else {
            tracing::trace!(kind = %session.kind(), "Unsupported capture configuration");
            return false;
        };

        if mode == *self.mode.value()
            && resolution == *self.resolution.value()
            && framerate == *self.framerate.value()
        {
            return false;
        }

        let command = CameraCommand::Configure {
            mode,
            resolution,
            framerate,
        };
        if !self.backend.submit(command) {
            tracing::warn!(kind = %session.kind(), ?command, "Backend rejected capture configuration");
            return false;
        }

        self.mode.request_change(mode, |_| true, session);
        self.resolution.request_change(resolution, |_| true, session);
        self.framerate.request_change(framerate, |_| true, session);
        true
    }

    /// Apply the device's model name.
    pub fn on_model(&mut self, model: impl Into<String>, session: &mut ChangeSession<'_>) -> bool {
        session.update(&mut self.model, model.into())
    }

    /// Apply the device's anti-flicker capabilities and current mode.
    pub fn on_anti_flicker(
        &mut self,
        supported: impl IntoIterator<Item = AntiFlickerMode>,
        current: AntiFlickerMode,
        session: &mut ChangeSession<'_>,
    ) -> bool {
        self.anti_flicker
            .confirm_with(DiscreteSet::new(supported), current, session)
    }

    /// Apply a capture configuration report. All three settings change in
    /// the caller's session, so subscribers see them together.
    pub fn on_config(&mut self, report: ConfigReport, session: &mut ChangeSession<'_>) -> bool {
        let mode = self
            .mode
            .confirm_with(DiscreteSet::new(report.modes), report.mode, session);
        let resolution = self.resolution.confirm_with(
            DiscreteSet::new(report.resolutions),
            report.resolution,
            session,
        );
        let framerate = self.framerate.confirm_with(
            DiscreteSet::new(report.framerates),
            report.framerate,
            session,
        );
        mode || resolution || framerate
    }

    /// Apply the device's exposure compensation range and current value.
    pub fn on_exposure_compensation(
        &mut self,
        min: f32,
        max: f32,
        current: f32,
        session: &mut ChangeSession<'_>,
    ) -> bool {
        self.exposure_compensation
            .confirm_with(Bounds::new(min, max), current, session)
    }
}

impl Component for Camera {
    fn kind(&self) -> ComponentKind {
        ComponentKind::Camera
    }

    fn for_each_setting(&mut self, visit: &mut dyn FnMut(&mut dyn SettingControl)) {
        visit(&mut self.anti_flicker);
        visit(&mut self.mode);
        visit(&mut self.resolution);
        visit(&mut self.framerate);
        visit(&mut self.exposure_compensation);
    }
}

impl std::fmt::Debug for Camera {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Camera")
            .field("model", &self.model)
            .field("anti_flicker", &self.anti_flicker)
            .field("mode", &self.mode)
            .field("resolution", &self.resolution)
            .field("framerate", &self.framerate)
            .field("exposure_compensation", &self.exposure_compensation)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aerosync_test_helpers::backend::CommandLog;

    fn camera(log: &CommandLog<CameraCommand>) -> Camera {
        Camera::new(log.clone())
    }

    fn report() -> ConfigReport {
        ConfigReport {
            modes: vec![CameraMode::Photo, CameraMode::Recording],
            resolutions: vec![Resolution::Uhd4k, Resolution::Fhd1080p],
            framerates: vec![Framerate::Fps30, Framerate::Fps60],
            mode: CameraMode::Photo,
            resolution: Resolution::Fhd1080p,
            framerate: Framerate::Fps30,
        }
    }

    #[test]
    fn test_configure_sends_one_command() -> Result<(), Box<dyn std::error::Error>> {
        let mut timers = ManualTimers::new();
        let log = CommandLog::new();
        let mut camera = camera(&log);
        let mut session = ChangeSession::new(ComponentKind::Camera, &mut timers);
        camera.on_config(report(), &mut session);

        assert!(camera.configure(
            CameraMode::Recording,
            Resolution::Uhd4k,
            Framerate::Fps30,
            &mut session
        ));
        assert_eq!(
            log.commands(),
            vec![CameraCommand::Configure {
                mode: CameraMode::Recording,
                resolution: Resolution::Uhd4k,
                framerate: Framerate::Fps30,
            }]
        );
        assert!(camera.mode().is_updating());
        assert!(camera.resolution().is_updating());
        assert!(!camera.framerate().is_updating());
        Ok(())
    }

    #[test]
    fn test_configure_with_unsupported_value_changes_nothing() {
        let mut timers = ManualTimers::new();
        let mut camera = camera(&CommandLog::new());
        {
            let mut session = ChangeSession::new(ComponentKind::Camera, &mut timers);
            camera.on_config(report(), &mut session);
        }

        let mut session = ChangeSession::new(ComponentKind::Camera, &mut timers);
        assert!(!camera.configure(
            CameraMode::Recording,
            Resolution::Hd720p,
            Framerate::Fps60,
            &mut session
        ));
        assert!(!session.finish());
        assert_eq!(*camera.mode().value(), CameraMode::Photo);
    }

    #[test]
    fn test_rejected_anti_flicker_is_not_applied() {
        let mut timers = ManualTimers::new();
        let log = CommandLog::rejecting();
        let mut camera = camera(&log);
        let mut session = ChangeSession::new(ComponentKind::Camera, &mut timers);
        camera.on_anti_flicker(
            [AntiFlickerMode::Hz50, AntiFlickerMode::Hz60],
            AntiFlickerMode::Hz50,
            &mut session,
        );

        assert!(!camera.set_anti_flicker(AntiFlickerMode::Hz60, &mut session));
        assert_eq!(*camera.anti_flicker().value(), AntiFlickerMode::Hz50);
        assert_eq!(log.commands(), vec![CameraCommand::AntiFlicker(AntiFlickerMode::Hz60)]);
    }

    #[test]
    fn test_undeclared_capabilities_are_not_settable() {
        let mut timers = ManualTimers::new();
        let log = CommandLog::new();
        let mut camera = camera(&log);
        let mut session = ChangeSession::new(ComponentKind::Camera, &mut timers);

        assert!(!camera.anti_flicker().is_settable());
        assert!(!camera.set_anti_flicker(AntiFlickerMode::Auto, &mut session));
        assert!(!camera.set_exposure_compensation(1.0, &mut session));
        assert!(log.is_empty());
    }

    #[test]
    fn test_declared_modes_replace_placeholder() {
        let mut timers = ManualTimers::new();
        let log = CommandLog::new();
        let mut camera = camera(&log);
        let mut session = ChangeSession::new(ComponentKind::Camera, &mut timers);
        camera.on_anti_flicker(
            [AntiFlickerMode::Hz50, AntiFlickerMode::Hz60],
            AntiFlickerMode::Hz50,
            &mut session,
        );

        assert!(!camera.anti_flicker().constraint().contains(&AntiFlickerMode::Off));
        assert!(!camera.set_anti_flicker(AntiFlickerMode::Off, &mut session));
        assert!(log.is_empty());
    }
}

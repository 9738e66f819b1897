//! Session configuration

use crate::error::GameError;
use crate::track::TrackConfig;
use crate::vehicle::VehicleConfig;
use circuit_input::Bindings;
use circuit_physics::PhysicsConfig;
use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Ground slab large enough to hold the default circuit and its barriers
pub const GROUND_HALF_EXTENTS: Vec3 = Vec3::new(100.0, 0.1, 100.0);

/// Camera behaviour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CameraMode {
    /// Mouse-look fly camera
    Free,
    /// Driver's eye
    FirstPerson,
    /// Smoothed chase camera behind the car
    #[default]
    ThirdPerson,
}

impl CameraMode {
    /// Mode selected by the change-camera command
    pub fn next(self) -> Self {
        match self {
            Self::ThirdPerson => Self::FirstPerson,
            Self::FirstPerson => Self::Free,
            Self::Free => Self::ThirdPerson,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Free => "free",
            Self::FirstPerson => "first-person",
            Self::ThirdPerson => "third-person",
        }
    }
}

impl std::fmt::Display for CameraMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for CameraMode {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('_', "-").as_str() {
            "free" => Ok(Self::Free),
            "first-person" | "firstperson" => Ok(Self::FirstPerson),
            "third-person" | "thirdperson" => Ok(Self::ThirdPerson),
            other => Err(GameError::InvalidConfig(format!("unknown camera mode '{}'", other))),
        }
    }
}

/// Everything needed to build a session
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Initial camera mode
    pub camera_mode: CameraMode,
    /// Vertical field of view in degrees
    pub fov: f32,
    /// Radians of look rotation per pixel of mouse motion
    pub mouse_sensitivity: f32,
    /// Ask the renderer to show the frame-rate overlay
    pub show_fps: bool,
    /// Longest frame delta fed into the simulation (seconds)
    pub max_frame_delta: f32,
    pub physics: PhysicsConfig,
    pub vehicle: VehicleConfig,
    pub track: TrackConfig,
    pub bindings: Bindings,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            camera_mode: CameraMode::ThirdPerson,
            fov: 90.0,
            mouse_sensitivity: 0.002,
            show_fps: true,
            max_frame_delta: 0.1,
            physics: PhysicsConfig::default().with_ground(GROUND_HALF_EXTENTS),
            vehicle: VehicleConfig::default(),
            track: TrackConfig::default(),
            bindings: Bindings::default(),
        }
    }
}

impl GameConfig {
    pub fn with_camera_mode(mut self, mode: CameraMode) -> Self {
        self.camera_mode = mode;
        self
    }

    pub fn with_fov(mut self, fov: f32) -> Self {
        self.fov = fov;
        self
    }

    pub fn with_mouse_sensitivity(mut self, sensitivity: f32) -> Self {
        self.mouse_sensitivity = sensitivity;
        self
    }

    pub fn with_show_fps(mut self, show: bool) -> Self {
        self.show_fps = show;
        self
    }

    pub fn with_vehicle(mut self, vehicle: VehicleConfig) -> Self {
        self.vehicle = vehicle;
        self
    }

    pub fn with_track(mut self, track: TrackConfig) -> Self {
        self.track = track;
        self
    }

    pub fn with_bindings(mut self, bindings: Bindings) -> Self {
        self.bindings = bindings;
        self
    }

    /// Reject values the session cannot run with
    pub fn validate(&self) -> Result<(), GameError> {
        if !(self.fov > 0.0 && self.fov < 180.0) {
            return Err(GameError::InvalidConfig(format!(
                "fov must be in (0, 180) degrees, got {}",
                self.fov
            )));
        }
        if !(self.max_frame_delta > 0.0) {
            return Err(GameError::InvalidConfig(format!(
                "max_frame_delta must be positive, got {}",
                self.max_frame_delta
            )));
        }
        if !self.mouse_sensitivity.is_finite() {
            return Err(GameError::InvalidConfig("mouse_sensitivity must be finite".into()));
        }
        self.physics.validate().map_err(GameError::InvalidConfig)?;
        self.vehicle.validate()?;
        self.track.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_camera_cycle() {
        let mut mode = CameraMode::ThirdPerson;
        mode = mode.next();
        assert_eq!(mode, CameraMode::FirstPerson);
        mode = mode.next();
        assert_eq!(mode, CameraMode::Free);
        mode = mode.next();
        assert_eq!(mode, CameraMode::ThirdPerson);
    }

    #[test]
    fn test_camera_mode_parse() {
        for mode in [CameraMode::Free, CameraMode::FirstPerson, CameraMode::ThirdPerson] {
            assert_eq!(mode.as_str().parse::<CameraMode>().unwrap(), mode);
        }
        assert_eq!("Third_Person".parse::<CameraMode>().unwrap(), CameraMode::ThirdPerson);
        assert!("orbit".parse::<CameraMode>().is_err());
    }

    #[test]
    fn test_defaults_validate() {
        let config = GameConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.fov, 90.0);
        assert_eq!(config.max_frame_delta, 0.1);
    }

    #[test]
    fn test_invalid_fov() {
        let config = GameConfig::default().with_fov(0.0);
        assert!(matches!(config.validate(), Err(GameError::InvalidConfig(_))));
    }
}

//! Command set to driving controls

use crate::command::Command;
use crate::state::InputState;
use serde::{Deserialize, Serialize};

/// Driver input for one vehicle update
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct VehicleControls {
    /// 0..=1
    pub throttle: f32,
    /// 0..=1
    pub brake: f32,
    /// -1 (left) ..= 1 (right)
    pub steering: f32,
}

impl VehicleControls {
    /// No throttle, no brake, wheels straight
    pub const NEUTRAL: Self = Self {
        throttle: 0.0,
        brake: 0.0,
        steering: 0.0,
    };

    pub fn new(throttle: f32, brake: f32, steering: f32) -> Self {
        Self {
            throttle,
            brake,
            steering,
        }
        .clamped()
    }

    /// Clamp every axis into its range. Non-finite values become zero.
    pub fn clamped(self) -> Self {
        fn clamp(v: f32, lo: f32, hi: f32) -> f32 {
            if v.is_finite() {
                v.clamp(lo, hi)
            } else {
                0.0
            }
        }
        Self {
            throttle: clamp(self.throttle, 0.0, 1.0),
            brake: clamp(self.brake, 0.0, 1.0),
            steering: clamp(self.steering, -1.0, 1.0),
        }
    }

    /// Read the driving commands
    pub fn from_input(input: &InputState) -> Self {
        let axis = |on: bool| if on { 1.0 } else { 0.0 };
        Self {
            throttle: axis(input.is_command_active(Command::Forward)),
            brake: axis(input.is_command_active(Command::Backward)),
            steering: axis(input.is_command_active(Command::Right))
                - axis(input.is_command_active(Command::Left)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_neutral_without_keys() {
        let input = InputState::default();
        assert_eq!(VehicleControls::from_input(&input), VehicleControls::NEUTRAL);
    }

    #[test]
    fn test_mapping() {
        let mut input = InputState::default();
        input.key_down("KeyW");
        input.key_down("KeyA");
        assert_eq!(
            VehicleControls::from_input(&input),
            VehicleControls::new(1.0, 0.0, -1.0)
        );

        input.key_up("KeyW");
        input.key_down("KeyS");
        input.key_down("KeyD");
        let controls = VehicleControls::from_input(&input);
        assert_eq!(controls.brake, 1.0);
        assert_eq!(controls.steering, 0.0);
    }

    #[test]
    fn test_clamped() {
        let c = VehicleControls::new(2.0, -1.0, f32::NAN);
        assert_eq!(c, VehicleControls::new(1.0, 0.0, 0.0));
        assert_eq!(VehicleControls::new(0.5, 0.5, -3.0).steering, -1.0);
    }
}

//! Physics configuration

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Physics world configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Gravity vector (default: -9.81 in Y)
    pub gravity: Vec3,

    /// Solver iterations per step
    pub solver_iterations: usize,

    /// Half-extents of the static ground slab created on initialization
    pub ground_half_extents: Vec3,

    /// Friction of the ground slab
    pub ground_friction: f32,

    /// Default friction coefficient for new colliders
    pub default_friction: f32,

    /// Default restitution (bounciness) for new colliders
    pub default_restitution: f32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: Vec3::new(0.0, -9.81, 0.0),
            solver_iterations: 4,
            ground_half_extents: Vec3::new(50.0, 0.1, 50.0),
            ground_friction: 0.5,
            default_friction: 0.5,
            default_restitution: 0.0,
        }
    }
}

impl PhysicsConfig {
    /// Set gravity
    pub fn with_gravity(mut self, x: f32, y: f32, z: f32) -> Self {
        self.gravity = Vec3::new(x, y, z);
        self
    }

    /// Set the ground slab size
    pub fn with_ground(mut self, half_extents: Vec3) -> Self {
        self.ground_half_extents = half_extents;
        self
    }

    /// Check that the configuration can drive a simulation
    pub fn validate(&self) -> Result<(), String> {
        if !self.gravity.is_finite() {
            return Err(format!("gravity must be finite, got {:?}", self.gravity));
        }
        if self.solver_iterations == 0 {
            return Err("solver_iterations must be at least 1".to_string());
        }
        if !self.ground_half_extents.is_finite() || self.ground_half_extents.min_element() <= 0.0 {
            return Err(format!(
                "ground half-extents must be positive, got {:?}",
                self.ground_half_extents
            ));
        }
        Ok(())
    }
}

//! Rigid body descriptors and handles

use crate::convert::{to_isometry, to_vector};
use glam::{Quat, Vec3};
use rapier3d::prelude as rapier;
use serde::{Deserialize, Serialize};

/// Non-owning reference to a body; the body lives until removed from the world
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RigidBodyHandle(pub(crate) rapier::RigidBodyHandle);

impl RigidBodyHandle {
    pub fn raw(&self) -> rapier::RigidBodyHandle {
        self.0
    }
}

/// How the solver treats a body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RigidBodyType {
    /// Never moves
    Fixed,
    #[default]
    Dynamic,
}

impl From<RigidBodyType> for rapier::RigidBodyType {
    fn from(t: RigidBodyType) -> Self {
        match t {
            RigidBodyType::Fixed => rapier::RigidBodyType::Fixed,
            RigidBodyType::Dynamic => rapier::RigidBodyType::Dynamic,
        }
    }
}

/// Everything needed to create a body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RigidBodyDesc {
    pub body_type: RigidBodyType,
    pub position: Vec3,
    pub rotation: Quat,
    pub linear_velocity: Vec3,
    pub linear_damping: f32,
    pub angular_damping: f32,
    /// Allow the solver to deactivate the body at rest
    pub can_sleep: bool,
    pub ccd_enabled: bool,
}

impl Default for RigidBodyDesc {
    fn default() -> Self {
        Self {
            body_type: RigidBodyType::Dynamic,
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            linear_velocity: Vec3::ZERO,
            linear_damping: 0.0,
            angular_damping: 0.0,
            can_sleep: true,
            ccd_enabled: false,
        }
    }
}

impl RigidBodyDesc {
    pub fn fixed() -> Self {
        Self {
            body_type: RigidBodyType::Fixed,
            ..Default::default()
        }
    }

    pub fn dynamic() -> Self {
        Self {
            body_type: RigidBodyType::Dynamic,
            ..Default::default()
        }
    }

    pub fn with_position(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    pub fn with_rotation(mut self, rotation: Quat) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_linear_velocity(mut self, velocity: Vec3) -> Self {
        self.linear_velocity = velocity;
        self
    }

    /// Set linear and angular damping
    pub fn with_damping(mut self, linear: f32, angular: f32) -> Self {
        self.linear_damping = linear;
        self.angular_damping = angular;
        self
    }

    pub fn with_can_sleep(mut self, can_sleep: bool) -> Self {
        self.can_sleep = can_sleep;
        self
    }

    pub fn with_ccd(mut self, enabled: bool) -> Self {
        self.ccd_enabled = enabled;
        self
    }

    pub(crate) fn to_rapier_builder(&self) -> rapier::RigidBodyBuilder {
        rapier::RigidBodyBuilder::new(self.body_type.into())
            .position(to_isometry(self.position, self.rotation))
            .linvel(to_vector(self.linear_velocity))
            .linear_damping(self.linear_damping)
            .angular_damping(self.angular_damping)
            .can_sleep(self.can_sleep)
            .ccd_enabled(self.ccd_enabled)
    }
}

//! Visual transform shared between the vehicle and its followers

use glam::{Mat4, Quat, Vec3};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Position, rotation and scale of a scene object
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    pub const IDENTITY: Self = Self {
        position: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    };

    #[inline]
    pub fn from_position_rotation(position: Vec3, rotation: Quat) -> Self {
        Self {
            position,
            rotation,
            scale: Vec3::ONE,
        }
    }

    /// Local +Z in world space
    #[inline]
    pub fn forward(&self) -> Vec3 {
        self.rotation * Vec3::Z
    }

    /// Local +X in world space
    #[inline]
    pub fn right(&self) -> Vec3 {
        self.rotation * Vec3::X
    }

    #[inline]
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.position)
    }
}

/// A transform written by its owner and read by followers
pub type SharedTransform = Arc<RwLock<Transform>>;

/// Rotation about +Y that turns local +Z toward `yaw`
#[inline]
pub fn yaw_rotation(yaw: f32) -> Quat {
    Quat::from_rotation_y(yaw)
}

/// Yaw of a direction's horizontal component, measured from +Z toward +X
#[inline]
pub fn heading_of(direction: Vec3) -> f32 {
    direction.x.atan2(direction.z)
}

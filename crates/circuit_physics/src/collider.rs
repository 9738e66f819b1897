//! Collider descriptors and handles

use crate::convert::to_isometry;
use crate::material::PhysicsMaterial;
use glam::{Quat, Vec3};
use rapier3d::prelude as rapier;
use serde::{Deserialize, Serialize};

/// Non-owning reference to a collider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ColliderHandle(pub(crate) rapier::ColliderHandle);

impl ColliderHandle {
    pub fn raw(&self) -> rapier::ColliderHandle {
        self.0
    }
}

/// Collision geometry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ColliderShape {
    Cuboid { half_extents: Vec3 },
    Ball { radius: f32 },
}

impl Default for ColliderShape {
    fn default() -> Self {
        Self::Cuboid {
            half_extents: Vec3::splat(0.5),
        }
    }
}

impl ColliderShape {
    pub fn cuboid(hx: f32, hy: f32, hz: f32) -> Self {
        Self::Cuboid {
            half_extents: Vec3::new(hx, hy, hz),
        }
    }

    /// Box of the given full width, height and length
    pub fn from_size(size: Vec3) -> Self {
        Self::Cuboid {
            half_extents: size * 0.5,
        }
    }

    pub fn ball(radius: f32) -> Self {
        Self::Ball { radius }
    }

    /// Half-extents if this is a cuboid
    pub fn half_extents(&self) -> Option<Vec3> {
        match self {
            Self::Cuboid { half_extents } => Some(*half_extents),
            _ => None,
        }
    }

    pub(crate) fn to_rapier(&self) -> rapier::SharedShape {
        match self {
            Self::Cuboid { half_extents } => {
                rapier::SharedShape::cuboid(half_extents.x, half_extents.y, half_extents.z)
            }
            Self::Ball { radius } => rapier::SharedShape::ball(*radius),
        }
    }
}

/// Everything needed to create a collider
///
/// For a collider with a parent body the pose is relative to that body;
/// without a parent it is a world pose.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColliderDesc {
    pub shape: ColliderShape,
    /// Translation (local to parent, or world when fixed to the origin)
    pub translation: Vec3,
    /// Rotation (local to parent, or world when fixed to the origin)
    pub rotation: Quat,
    pub material: PhysicsMaterial,
    /// Report collision start/stop events for this collider
    pub collision_events: bool,
    /// User data (tags the owner of the collider)
    pub user_data: u128,
}

impl Default for ColliderDesc {
    fn default() -> Self {
        Self {
            shape: ColliderShape::default(),
            translation: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            material: PhysicsMaterial::default(),
            collision_events: false,
            user_data: 0,
        }
    }
}

impl ColliderDesc {
    pub fn new(shape: ColliderShape) -> Self {
        Self {
            shape,
            ..Default::default()
        }
    }

    pub fn with_pose(mut self, translation: Vec3, rotation: Quat) -> Self {
        self.translation = translation;
        self.rotation = rotation;
        self
    }

    pub fn with_translation(mut self, translation: Vec3) -> Self {
        self.translation = translation;
        self
    }

    pub fn with_material(mut self, material: PhysicsMaterial) -> Self {
        self.material = material;
        self
    }

    /// Report contact start/stop for this collider
    pub fn with_collision_events(mut self, enabled: bool) -> Self {
        self.collision_events = enabled;
        self
    }

    pub fn with_user_data(mut self, data: u128) -> Self {
        self.user_data = data;
        self
    }

    pub(crate) fn to_rapier_builder(&self) -> rapier::ColliderBuilder {
        let mut builder = rapier::ColliderBuilder::new(self.shape.to_rapier())
            .position(to_isometry(self.translation, self.rotation))
            .friction(self.material.friction)
            .restitution(self.material.restitution)
            .friction_combine_rule(self.material.friction_combine.into())
            .restitution_combine_rule(self.material.restitution_combine.into())
            .user_data(self.user_data);

        builder = match self.material.mass {
            Some(mass) => builder.mass(mass),
            None => builder.density(self.material.density),
        };

        if self.collision_events {
            builder = builder.active_events(rapier::ActiveEvents::COLLISION_EVENTS);
        }

        builder
    }
}

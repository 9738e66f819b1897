//! Circuit Physics - Rapier 3D Integration
//!
//! Owns the rigid-body simulation for the racing game. Everything else in the
//! workspace talks to Rapier only through this crate.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │                 PhysicsWorld                 │
//! │   (uninitialised until initialize() runs)    │
//! │  ┌─────────────┐  ┌─────────────┐            │
//! │  │ RigidBodySet│  │ ColliderSet │  ground    │
//! │  └─────────────┘  └─────────────┘            │
//! │  ┌──────────────────────────────────────────┐│
//! │  │  PhysicsPipeline (one step per frame dt) ││
//! │  └──────────────────────────────────────────┘│
//! └──────────────────────────────────────────────┘
//!          │                        │
//!          ▼                        ▼
//!   RigidBodyHandle           ColliderHandle
//!   (vehicle chassis)         (chassis, barriers)
//! ```
//!
//! # Example
//!
//! ```ignore
//! use circuit_physics::prelude::*;
//! use glam::Vec3;
//!
//! let mut physics = PhysicsWorld::new(PhysicsConfig::default());
//! physics.initialize()?;
//!
//! let body = physics
//!     .create_rigid_body(RigidBodyDesc::dynamic().with_position(Vec3::new(0.0, 10.0, 0.0)))
//!     .expect("world is initialised");
//! physics.create_collider(ColliderDesc::new(ColliderShape::cuboid(0.5, 0.5, 0.5)), Some(body));
//!
//! physics.step(1.0 / 60.0);
//! ```

pub mod body;
pub mod collider;
pub mod config;
pub mod error;
pub mod events;
pub mod material;
pub mod world;

mod convert;

pub mod prelude {
    //! Common imports for physics functionality
    pub use crate::body::{RigidBodyDesc, RigidBodyHandle, RigidBodyType};
    pub use crate::collider::{ColliderDesc, ColliderHandle, ColliderShape};
    pub use crate::config::PhysicsConfig;
    pub use crate::error::{PhysicsError, Result};
    pub use crate::events::CollisionEvent;
    pub use crate::material::{CombineRule, PhysicsMaterial};
    pub use crate::world::PhysicsWorld;
}

pub use prelude::*;

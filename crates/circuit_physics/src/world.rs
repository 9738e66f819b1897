//! Physics world - main simulation container

use crate::body::{RigidBodyDesc, RigidBodyHandle};
use crate::collider::{ColliderDesc, ColliderHandle, ColliderShape};
use crate::config::PhysicsConfig;
use crate::convert::{from_rotation, from_vector, to_vector};
use crate::error::{PhysicsError, Result};
use crate::events::{ChannelEventCollector, CollisionEvent};
use crate::material::PhysicsMaterial;
use glam::{Quat, Vec3};
use rapier3d::prelude as rapier;
use std::num::NonZeroUsize;

/// Rapier state that only exists once the world is initialized
struct Simulation {
    pipeline: rapier::PhysicsPipeline,
    gravity: rapier::Vector<f32>,
    integration_params: rapier::IntegrationParameters,
    islands: rapier::IslandManager,
    broad_phase: rapier::DefaultBroadPhase,
    narrow_phase: rapier::NarrowPhase,
    impulse_joints: rapier::ImpulseJointSet,
    multibody_joints: rapier::MultibodyJointSet,
    ccd_solver: rapier::CCDSolver,
    bodies: rapier::RigidBodySet,
    colliders: rapier::ColliderSet,
}

impl Simulation {
    fn new(config: &PhysicsConfig) -> Self {
        let mut integration_params = rapier::IntegrationParameters::default();
        integration_params.num_solver_iterations =
            NonZeroUsize::new(config.solver_iterations).unwrap_or(NonZeroUsize::MIN);

        Self {
            pipeline: rapier::PhysicsPipeline::new(),
            gravity: to_vector(config.gravity),
            integration_params,
            islands: rapier::IslandManager::new(),
            broad_phase: rapier::DefaultBroadPhase::new(),
            narrow_phase: rapier::NarrowPhase::new(),
            impulse_joints: rapier::ImpulseJointSet::new(),
            multibody_joints: rapier::MultibodyJointSet::new(),
            ccd_solver: rapier::CCDSolver::new(),
            bodies: rapier::RigidBodySet::new(),
            colliders: rapier::ColliderSet::new(),
        }
    }
}

/// The physics world containing all simulation state
///
/// Created uninitialized; [`PhysicsWorld::initialize`] brings the simulation
/// up. Until then every factory returns `None` and `step` does nothing.
pub struct PhysicsWorld {
    /// Configuration
    config: PhysicsConfig,

    /// Live simulation (None until initialized)
    simulation: Option<Simulation>,

    /// Static ground slab
    ground: Option<ColliderHandle>,

    /// Collision events from the last step
    events: Vec<CollisionEvent>,
}

impl PhysicsWorld {
    /// Create an uninitialized physics world
    pub fn new(config: PhysicsConfig) -> Self {
        Self {
            config,
            simulation: None,
            ground: None,
            events: Vec::new(),
        }
    }

    /// Get the physics configuration
    pub fn config(&self) -> &PhysicsConfig {
        &self.config
    }

    /// Bring up the simulation with the configured gravity and ground slab
    ///
    /// Failure is unrecoverable for the caller: nothing is left half-built.
    pub fn initialize(&mut self) -> Result<()> {
        if self.simulation.is_some() {
            log::warn!("Physics world already initialized");
            return Ok(());
        }

        self.config
            .validate()
            .map_err(PhysicsError::InitializationFailed)?;

        self.simulation = Some(Simulation::new(&self.config));
        self.ground = self.create_ground();

        log::info!(
            "Physics world initialized (gravity {:?}, ground {:?})",
            self.config.gravity,
            self.config.ground_half_extents
        );
        Ok(())
    }

    /// Whether `initialize` has completed
    pub fn is_initialized(&self) -> bool {
        self.simulation.is_some()
    }

    fn create_ground(&mut self) -> Option<ColliderHandle> {
        let half = self.config.ground_half_extents;
        let material = PhysicsMaterial::new(self.config.ground_friction, 0.0);
        self.create_collider(
            ColliderDesc::new(ColliderShape::cuboid(half.x, half.y, half.z)).with_material(material),
            None,
        )
    }

    /// The ground slab collider, if initialized
    pub fn ground(&self) -> Option<ColliderHandle> {
        self.ground
    }

    /// Get gravity
    pub fn gravity(&self) -> Vec3 {
        self.config.gravity
    }

    // ==================== Rigid Bodies ====================

    /// Create a rigid body, or `None` if the world is not initialized
    pub fn create_rigid_body(&mut self, desc: RigidBodyDesc) -> Option<RigidBodyHandle> {
        let sim = self.simulation.as_mut()?;
        let handle = sim.bodies.insert(desc.to_rapier_builder());
        Some(RigidBodyHandle(handle))
    }

    /// Remove a rigid body along with its attached colliders
    pub fn remove_rigid_body(&mut self, handle: RigidBodyHandle) -> Result<()> {
        let sim = self.simulation.as_mut().ok_or(PhysicsError::NotInitialized)?;
        sim.bodies
            .remove(
                handle.0,
                &mut sim.islands,
                &mut sim.colliders,
                &mut sim.impulse_joints,
                &mut sim.multibody_joints,
                true,
            )
            .map(|_| ())
            .ok_or(PhysicsError::BodyNotFound(handle))
    }

    fn body(&self, handle: RigidBodyHandle) -> Result<&rapier::RigidBody> {
        self.simulation
            .as_ref()
            .ok_or(PhysicsError::NotInitialized)?
            .bodies
            .get(handle.0)
            .ok_or(PhysicsError::BodyNotFound(handle))
    }

    fn body_mut(&mut self, handle: RigidBodyHandle) -> Result<&mut rapier::RigidBody> {
        self.simulation
            .as_mut()
            .ok_or(PhysicsError::NotInitialized)?
            .bodies
            .get_mut(handle.0)
            .ok_or(PhysicsError::BodyNotFound(handle))
    }

    /// Get rigid body position
    pub fn body_position(&self, handle: RigidBodyHandle) -> Result<Vec3> {
        self.body(handle).map(|b| from_vector(b.translation()))
    }

    /// Get rigid body orientation
    pub fn body_rotation(&self, handle: RigidBodyHandle) -> Result<Quat> {
        self.body(handle).map(|b| from_rotation(b.rotation()))
    }

    /// Teleport a rigid body
    pub fn set_body_pose(&mut self, handle: RigidBodyHandle, position: Vec3, rotation: Quat) -> Result<()> {
        self.body_mut(handle).map(|b| {
            b.set_position(crate::convert::to_isometry(position, rotation), true);
        })
    }

    /// Get rigid body linear velocity
    pub fn body_linear_velocity(&self, handle: RigidBodyHandle) -> Result<Vec3> {
        self.body(handle).map(|b| from_vector(b.linvel()))
    }

    /// Set rigid body linear velocity
    pub fn set_body_linear_velocity(&mut self, handle: RigidBodyHandle, velocity: Vec3) -> Result<()> {
        self.body_mut(handle).map(|b| b.set_linvel(to_vector(velocity), true))
    }

    /// Get rigid body angular velocity
    pub fn body_angular_velocity(&self, handle: RigidBodyHandle) -> Result<Vec3> {
        self.body(handle).map(|b| from_vector(b.angvel()))
    }

    /// Set rigid body angular velocity
    pub fn set_body_angular_velocity(&mut self, handle: RigidBodyHandle, velocity: Vec3) -> Result<()> {
        self.body_mut(handle).map(|b| b.set_angvel(to_vector(velocity), true))
    }

    /// Get the rigid body mass
    pub fn body_mass(&self, handle: RigidBodyHandle) -> Result<f32> {
        self.body(handle).map(|b| b.mass())
    }

    /// Add a force at the center of mass; it acts until [`Self::reset_forces`]
    pub fn add_force(&mut self, handle: RigidBodyHandle, force: Vec3) -> Result<()> {
        self.body_mut(handle).map(|b| b.add_force(to_vector(force), true))
    }

    /// Add a torque; it acts until [`Self::reset_forces`]
    pub fn add_torque(&mut self, handle: RigidBodyHandle, torque: Vec3) -> Result<()> {
        self.body_mut(handle).map(|b| b.add_torque(to_vector(torque), true))
    }

    /// Clear the accumulated user force and torque
    pub fn reset_forces(&mut self, handle: RigidBodyHandle) -> Result<()> {
        self.body_mut(handle).map(|b| {
            b.reset_forces(false);
            b.reset_torques(false);
        })
    }

    /// Accumulated user force
    pub fn body_force(&self, handle: RigidBodyHandle) -> Result<Vec3> {
        self.body(handle).map(|b| from_vector(&b.user_force()))
    }

    /// Accumulated user torque
    pub fn body_torque(&self, handle: RigidBodyHandle) -> Result<Vec3> {
        self.body(handle).map(|b| from_vector(&b.user_torque()))
    }

    // ==================== Colliders ====================

    /// Create a collider attached to a body, or fixed to the world origin
    ///
    /// Returns `None` if the world is not initialized.
    pub fn create_collider(
        &mut self,
        desc: ColliderDesc,
        parent: Option<RigidBodyHandle>,
    ) -> Option<ColliderHandle> {
        let sim = self.simulation.as_mut()?;
        let builder = desc.to_rapier_builder();
        let handle = match parent {
            Some(body) => sim.colliders.insert_with_parent(builder, body.0, &mut sim.bodies),
            None => sim.colliders.insert(builder),
        };
        Some(ColliderHandle(handle))
    }

    /// World-space translation of a collider
    pub fn collider_position(&self, handle: ColliderHandle) -> Result<Vec3> {
        self.simulation
            .as_ref()
            .ok_or(PhysicsError::NotInitialized)?
            .colliders
            .get(handle.0)
            .map(|c| from_vector(c.translation()))
            .ok_or(PhysicsError::ColliderNotFound(handle))
    }

    // ==================== Simulation ====================

    /// Advance the world by exactly one step of `delta_time` seconds
    ///
    /// No substepping: the integration timestep is set to the frame delta.
    /// Callers clamp hitches before calling.
    pub fn step(&mut self, delta_time: f32) {
        let Some(sim) = self.simulation.as_mut() else {
            return;
        };
        if !delta_time.is_finite() || delta_time <= 0.0 {
            log::warn!("Ignoring physics step with dt = {}", delta_time);
            return;
        }

        self.events.clear();
        sim.integration_params.dt = delta_time;

        let (collision_send, collision_recv) = crossbeam_channel::unbounded();
        let event_handler = ChannelEventCollector {
            collision_events: collision_send,
        };

        sim.pipeline.step(
            &sim.gravity,
            &sim.integration_params,
            &mut sim.islands,
            &mut sim.broad_phase,
            &mut sim.narrow_phase,
            &mut sim.bodies,
            &mut sim.colliders,
            &mut sim.impulse_joints,
            &mut sim.multibody_joints,
            &mut sim.ccd_solver,
            None,
            &(),
            &event_handler,
        );

        while let Ok(event) = collision_recv.try_recv() {
            let (h1, h2, started) = match event {
                rapier::CollisionEvent::Started(h1, h2, _) => (h1, h2, true),
                rapier::CollisionEvent::Stopped(h1, h2, _) => (h1, h2, false),
            };
            self.events.push(CollisionEvent {
                collider1: ColliderHandle(h1),
                collider2: ColliderHandle(h2),
                started,
                user_data1: sim.colliders.get(h1).map(|c| c.user_data).unwrap_or(0),
                user_data2: sim.colliders.get(h2).map(|c| c.user_data).unwrap_or(0),
            });
        }
    }

    // ==================== Events ====================

    /// Collision events from the last step
    pub fn collision_events(&self) -> &[CollisionEvent] {
        &self.events
    }

    // ==================== Debug ====================

    /// Get number of rigid bodies
    pub fn body_count(&self) -> usize {
        self.simulation.as_ref().map_or(0, |s| s.bodies.len())
    }

    /// Get number of colliders
    pub fn collider_count(&self) -> usize {
        self.simulation.as_ref().map_or(0, |s| s.colliders.len())
    }
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::new(PhysicsConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ready_world() -> PhysicsWorld {
        let mut world = PhysicsWorld::new(PhysicsConfig::default());
        world.initialize().unwrap();
        world
    }

    #[test]
    fn test_factories_need_initialize() {
        let mut world = PhysicsWorld::new(PhysicsConfig::default());
        assert!(!world.is_initialized());
        assert!(world.create_rigid_body(RigidBodyDesc::dynamic()).is_none());
        assert!(world
            .create_collider(ColliderDesc::new(ColliderShape::ball(1.0)), None)
            .is_none());
        world.step(1.0 / 60.0);
        assert_eq!(world.body_count(), 0);
    }

    #[test]
    fn test_initialize_creates_ground() {
        let world = ready_world();
        assert!(world.is_initialized());
        assert!(world.ground().is_some());
        assert_eq!(world.collider_count(), 1);
        assert_eq!(world.body_count(), 0);
    }

    #[test]
    fn test_initialize_twice_is_noop() {
        let mut world = ready_world();
        world.initialize().unwrap();
        assert_eq!(world.collider_count(), 1);
    }

    #[test]
    fn test_invalid_config_fails() {
        let mut world = PhysicsWorld::new(PhysicsConfig {
            solver_iterations: 0,
            ..Default::default()
        });
        assert!(matches!(
            world.initialize(),
            Err(PhysicsError::InitializationFailed(_))
        ));
        assert!(!world.is_initialized());
    }

    #[test]
    fn test_gravity_fall() {
        let mut world = ready_world();
        let body = world
            .create_rigid_body(RigidBodyDesc::dynamic().with_position(Vec3::new(0.0, 10.0, 0.0)))
            .unwrap();
        world.create_collider(ColliderDesc::new(ColliderShape::ball(0.5)), Some(body));

        let initial_y = world.body_position(body).unwrap().y;
        for _ in 0..30 {
            world.step(1.0 / 60.0);
        }
        let final_y = world.body_position(body).unwrap().y;
        assert!(final_y < initial_y, "Body should fall due to gravity");
    }

    #[test]
    fn test_body_rests_on_ground() {
        let mut world = ready_world();
        let body = world
            .create_rigid_body(RigidBodyDesc::dynamic().with_position(Vec3::new(0.0, 2.0, 0.0)))
            .unwrap();
        world.create_collider(ColliderDesc::new(ColliderShape::cuboid(0.5, 0.5, 0.5)), Some(body));

        for _ in 0..240 {
            world.step(1.0 / 60.0);
        }
        let y = world.body_position(body).unwrap().y;
        assert!((y - 0.6).abs() < 0.1, "box should rest on the slab, y = {}", y);
    }

    #[test]
    fn test_forces_accumulate_until_reset() {
        let mut world = ready_world();
        let body = world.create_rigid_body(RigidBodyDesc::dynamic()).unwrap();
        world.create_collider(ColliderDesc::new(ColliderShape::ball(0.5)), Some(body));

        world.add_force(body, Vec3::X * 10.0).unwrap();
        world.add_force(body, Vec3::X * 5.0).unwrap();
        world.add_torque(body, Vec3::Y * 2.0).unwrap();
        assert_eq!(world.body_force(body).unwrap(), Vec3::X * 15.0);
        assert_eq!(world.body_torque(body).unwrap(), Vec3::Y * 2.0);

        world.reset_forces(body).unwrap();
        assert_eq!(world.body_force(body).unwrap(), Vec3::ZERO);
        assert_eq!(world.body_torque(body).unwrap(), Vec3::ZERO);
    }

    #[test]
    fn test_explicit_collider_mass() {
        let mut world = ready_world();
        let body = world.create_rigid_body(RigidBodyDesc::dynamic()).unwrap();
        world.create_collider(
            ColliderDesc::new(ColliderShape::cuboid(0.9, 0.3, 2.0))
                .with_material(PhysicsMaterial::default().with_mass(1200.0)),
            Some(body),
        );
        assert!((world.body_mass(body).unwrap() - 1200.0).abs() < 1e-2);
    }

    #[test]
    fn test_remove_body_removes_colliders() {
        let mut world = ready_world();
        let body = world.create_rigid_body(RigidBodyDesc::dynamic()).unwrap();
        world.create_collider(ColliderDesc::new(ColliderShape::ball(0.5)), Some(body));
        assert_eq!(world.collider_count(), 2);

        world.remove_rigid_body(body).unwrap();
        assert_eq!(world.body_count(), 0);
        assert_eq!(world.collider_count(), 1);
        assert!(matches!(
            world.body_position(body),
            Err(PhysicsError::BodyNotFound(_))
        ));
    }

    #[test]
    fn test_degenerate_step_is_ignored() {
        let mut world = ready_world();
        let body = world
            .create_rigid_body(RigidBodyDesc::dynamic().with_position(Vec3::new(0.0, 10.0, 0.0)))
            .unwrap();
        world.step(f32::NAN);
        world.step(0.0);
        world.step(-1.0);
        assert_eq!(world.body_position(body).unwrap().y, 10.0);
    }

    #[test]
    fn test_collision_events_reported() {
        let mut world = ready_world();
        let body = world
            .create_rigid_body(RigidBodyDesc::dynamic().with_position(Vec3::new(0.0, 0.8, 0.0)))
            .unwrap();
        world.create_collider(
            ColliderDesc::new(ColliderShape::ball(0.5))
                .with_collision_events(true)
                .with_user_data(99),
            Some(body),
        );

        let mut saw_contact = false;
        for _ in 0..60 {
            world.step(1.0 / 60.0);
            saw_contact |= world
                .collision_events()
                .iter()
                .any(|e| e.is_started() && e.involves(99));
        }
        assert!(saw_contact);
    }
}

//! Physics-driven car
//!
//! The car is a single dynamic box. Wheels are visual only. Each update
//! clears last frame's forces, then the control law pushes the box:
//!
//! - throttle drives along the body's forward axis
//! - brake opposes motion while rolling forward, and reverses when (nearly) stopped
//! - steering yaws the body with a speed-proportional torque plus a grip force
//!   that cancels sideways slip
//!
//! Horizontal speed is clamped to the configured maximum. The visual transform
//! is then copied from the body; visuals never write back to physics.

use crate::error::{GameError, Result};
use crate::transform::{yaw_rotation, SharedTransform, Transform};
use circuit_input::VehicleControls;
use circuit_physics::{
    ColliderDesc, ColliderHandle, ColliderShape, CombineRule, PhysicsMaterial, PhysicsWorld,
    RigidBodyDesc, RigidBodyHandle,
};
use glam::{Quat, Vec2, Vec3};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Collider user data for the chassis
pub const VEHICLE_TAG: u128 = 0x1;

/// Longest step the control law integrates over
pub const MAX_DELTA: f32 = 0.1;
/// Steering smoothing rate (1/s)
const STEER_RATE: f32 = 8.0;
/// Forward speed above which the brake pedal brakes instead of reversing
const BRAKE_THRESHOLD: f32 = 0.5;
/// Reverse force as a fraction of the acceleration force
const REVERSE_FACTOR: f32 = 0.5;
const STEER_INPUT_DEADZONE: f32 = 0.01;
/// No steering below this forward speed
const STEER_MIN_SPEED: f32 = 1.0;
const STEER_TORQUE_GAIN: f32 = 100.0;
const GRIP_GAIN: f32 = 50.0;
/// Wheel spin per unit of forward speed
const WHEEL_SPIN_FACTOR: f32 = 2.0;

/// Car parameters, fixed at spawn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VehicleConfig {
    /// kg
    pub mass: f32,
    /// Full chassis size: width, height, length
    pub chassis_size: Vec3,
    pub wheel_radius: f32,
    pub wheel_width: f32,
    /// Distance between front and rear axles
    pub wheel_base: f32,
    /// Distance between left and right wheels
    pub track_width: f32,
    /// m/s, horizontal
    pub max_speed: f32,
    /// Drive force (N)
    pub acceleration: f32,
    /// Brake force (N)
    pub braking: f32,
    /// Steering angle at full lock (rad)
    pub steering: f32,
    pub chassis_friction: f32,
    pub chassis_restitution: f32,
    pub linear_damping: f32,
    pub angular_damping: f32,
}

impl Default for VehicleConfig {
    fn default() -> Self {
        Self {
            mass: 1200.0,
            chassis_size: Vec3::new(1.8, 0.6, 4.0),
            wheel_radius: 0.4,
            wheel_width: 0.3,
            wheel_base: 2.5,
            track_width: 1.6,
            max_speed: 50.0,
            acceleration: 3000.0,
            braking: 5000.0,
            steering: 0.8,
            chassis_friction: 0.1,
            chassis_restitution: 0.1,
            linear_damping: 0.5,
            angular_damping: 1.0,
        }
    }
}

impl VehicleConfig {
    pub fn with_mass(mut self, mass: f32) -> Self {
        self.mass = mass;
        self
    }

    pub fn with_max_speed(mut self, max_speed: f32) -> Self {
        self.max_speed = max_speed;
        self
    }

    pub fn with_acceleration(mut self, acceleration: f32) -> Self {
        self.acceleration = acceleration;
        self
    }

    pub fn with_braking(mut self, braking: f32) -> Self {
        self.braking = braking;
        self
    }

    pub fn with_steering(mut self, steering: f32) -> Self {
        self.steering = steering;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.mass > 0.0) {
            return Err(GameError::InvalidConfig(format!("vehicle mass must be positive, got {}", self.mass)));
        }
        if !(self.chassis_size.min_element() > 0.0) {
            return Err(GameError::InvalidConfig(format!(
                "chassis size must be positive, got {:?}",
                self.chassis_size
            )));
        }
        if !(self.max_speed > 0.0) {
            return Err(GameError::InvalidConfig(format!(
                "max speed must be positive, got {}",
                self.max_speed
            )));
        }
        if self.acceleration < 0.0 || self.braking < 0.0 || self.steering < 0.0 {
            return Err(GameError::InvalidConfig("vehicle forces and steering must not be negative".into()));
        }
        Ok(())
    }
}

/// A visual wheel
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Wheel {
    /// Position relative to the chassis
    pub offset: Vec3,
    pub is_front: bool,
    /// Accumulated spin about the axle (rad)
    pub roll: f32,
    /// Steer angle about +Y (rad), front wheels only
    pub steer: f32,
}

impl Wheel {
    /// Rotation relative to the chassis
    pub fn local_rotation(&self) -> Quat {
        Quat::from_rotation_y(self.steer) * Quat::from_rotation_x(self.roll)
    }
}

fn wheel_layout(config: &VehicleConfig) -> [Wheel; 4] {
    let x = config.track_width / 2.0;
    let z = config.wheel_base / 2.0;
    let wheel = |offset: Vec3, is_front: bool| Wheel {
        offset,
        is_front,
        roll: 0.0,
        steer: 0.0,
    };
    [
        wheel(Vec3::new(-x, 0.0, z), true),
        wheel(Vec3::new(x, 0.0, z), true),
        wheel(Vec3::new(-x, 0.0, -z), false),
        wheel(Vec3::new(x, 0.0, -z), false),
    ]
}

/// The player's car
#[derive(Debug)]
pub struct Vehicle {
    config: VehicleConfig,
    body: RigidBodyHandle,
    chassis: ColliderHandle,
    steering: f32,
    speed: f32,
    forward_speed: f32,
    wheels: [Wheel; 4],
    transform: SharedTransform,
}

impl Vehicle {
    /// Create the body and chassis collider at `position`, facing `heading`
    pub fn spawn(physics: &mut PhysicsWorld, position: Vec3, heading: f32, config: VehicleConfig) -> Result<Self> {
        config.validate()?;
        let rotation = yaw_rotation(heading);

        let body = physics
            .create_rigid_body(
                RigidBodyDesc::dynamic()
                    .with_position(position)
                    .with_rotation(rotation)
                    .with_damping(config.linear_damping, config.angular_damping)
                    .with_can_sleep(false),
            )
            .ok_or(GameError::PhysicsNotReady("vehicle body"))?;

        let material = PhysicsMaterial::new(config.chassis_friction, config.chassis_restitution)
            .with_friction_combine(CombineRule::Min)
            .with_mass(config.mass);
        let chassis = physics
            .create_collider(
                ColliderDesc::new(ColliderShape::from_size(config.chassis_size))
                    .with_material(material)
                    .with_collision_events(true)
                    .with_user_data(VEHICLE_TAG),
                Some(body),
            )
            .ok_or(GameError::PhysicsNotReady("vehicle chassis"))?;

        log::info!("Vehicle spawned at {:?}, heading {:.3} rad", position, heading);

        Ok(Self {
            wheels: wheel_layout(&config),
            config,
            body,
            chassis,
            steering: 0.0,
            speed: 0.0,
            forward_speed: 0.0,
            transform: Arc::new(RwLock::new(Transform::from_position_rotation(position, rotation))),
        })
    }

    /// Run the control law for one frame. Call before stepping physics.
    pub fn update(&mut self, physics: &mut PhysicsWorld, delta_time: f32, controls: VehicleControls) -> Result<()> {
        let dt = if delta_time.is_finite() {
            delta_time.clamp(0.0, MAX_DELTA)
        } else {
            0.0
        };
        let controls = controls.clamped();
        let body = self.body;

        physics.reset_forces(body)?;

        let target = controls.steering * self.config.steering;
        self.steering += (target - self.steering) * (dt * STEER_RATE).min(1.0);

        let rotation = physics.body_rotation(body)?;
        let forward = rotation * Vec3::Z;
        let right = rotation * Vec3::X;

        let velocity = physics.body_linear_velocity(body)?;
        self.speed = velocity.length();
        let forward_speed = velocity.dot(forward);
        self.forward_speed = forward_speed;

        if controls.throttle > 0.0 {
            physics.add_force(body, forward * self.config.acceleration * controls.throttle)?;
        }

        if controls.brake > 0.0 {
            let force = if forward_speed > BRAKE_THRESHOLD {
                -self.config.braking * controls.brake
            } else {
                -self.config.acceleration * REVERSE_FACTOR * controls.brake
            };
            physics.add_force(body, forward * force)?;
        }

        if controls.steering.abs() > STEER_INPUT_DEADZONE && forward_speed.abs() > STEER_MIN_SPEED {
            let torque = controls.steering * forward_speed.abs() * STEER_TORQUE_GAIN;
            physics.add_torque(body, Vec3::new(0.0, torque, 0.0))?;

            let lateral = velocity.dot(right);
            physics.add_force(body, right * (-lateral * GRIP_GAIN))?;
        }

        let horizontal = Vec2::new(velocity.x, velocity.z);
        if horizontal.length() > self.config.max_speed {
            let limited = horizontal.normalize() * self.config.max_speed;
            physics.set_body_linear_velocity(body, Vec3::new(limited.x, velocity.y, limited.y))?;
        }

        let spin = forward_speed * WHEEL_SPIN_FACTOR * dt;
        for wheel in &mut self.wheels {
            wheel.roll = (wheel.roll + spin) % std::f32::consts::TAU;
            if wheel.is_front {
                wheel.steer = self.steering;
            }
        }

        self.sync_transform(physics)
    }

    /// Copy the resolved body pose into the visual transform
    pub fn sync_transform(&mut self, physics: &PhysicsWorld) -> Result<()> {
        let position = physics.body_position(self.body)?;
        let rotation = physics.body_rotation(self.body)?;
        let mut transform = self.transform.write();
        transform.position = position;
        transform.rotation = rotation;
        Ok(())
    }

    /// Teleport to a pose and stop dead
    pub fn reset_to(&mut self, physics: &mut PhysicsWorld, position: Vec3, heading: f32) -> Result<()> {
        physics.set_body_pose(self.body, position, yaw_rotation(heading))?;
        physics.set_body_linear_velocity(self.body, Vec3::ZERO)?;
        physics.set_body_angular_velocity(self.body, Vec3::ZERO)?;
        physics.reset_forces(self.body)?;
        self.steering = 0.0;
        self.speed = 0.0;
        self.forward_speed = 0.0;
        for wheel in &mut self.wheels {
            wheel.steer = 0.0;
        }
        self.sync_transform(physics)
    }

    pub fn config(&self) -> &VehicleConfig {
        &self.config
    }

    pub fn body(&self) -> RigidBodyHandle {
        self.body
    }

    pub fn chassis_collider(&self) -> ColliderHandle {
        self.chassis
    }

    /// Position as of the last sync
    pub fn position(&self) -> Vec3 {
        self.transform.read().position
    }

    /// Orientation as of the last sync
    pub fn rotation(&self) -> Quat {
        self.transform.read().rotation
    }

    /// Velocity magnitude sampled at the start of the last update
    pub fn speed(&self) -> f32 {
        self.speed
    }

    /// Signed speed along the body's forward axis at the last update
    pub fn forward_speed(&self) -> f32 {
        self.forward_speed
    }

    /// Smoothed steering angle (rad)
    pub fn steering_angle(&self) -> f32 {
        self.steering
    }

    pub fn wheels(&self) -> &[Wheel; 4] {
        &self.wheels
    }

    /// Visual transform for followers such as the camera
    pub fn shared_transform(&self) -> SharedTransform {
        Arc::clone(&self.transform)
    }
}

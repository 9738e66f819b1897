//! Renderer seam
//!
//! The game hands a static [`SceneGraph`] to the renderer once, then one
//! [`FrameView`] per frame. Window, GPU and asset handling live behind the
//! [`Renderer`] trait.

use crate::track::{BarrierSegment, Checkpoint, RoadMesh, Track};
use crate::transform::Transform;
use crate::vehicle::{Vehicle, VehicleConfig};
use glam::{Mat4, Vec3};

/// Geometry that never changes during a session
#[derive(Debug, Clone, Default)]
pub struct SceneGraph {
    pub ground_half_extents: Vec3,
    pub road: RoadMesh,
    pub center_line: Vec<Vec3>,
    pub barriers: Vec<BarrierSegment>,
    pub checkpoints: Vec<Checkpoint>,
    pub track_width: f32,
    pub chassis_size: Vec3,
    pub wheel_radius: f32,
    pub wheel_width: f32,
}

impl SceneGraph {
    pub fn build(ground_half_extents: Vec3, track: &Track, vehicle: &VehicleConfig) -> Self {
        Self {
            ground_half_extents,
            road: track.road_mesh().clone(),
            center_line: track.center_line().to_vec(),
            barriers: track.barriers().to_vec(),
            checkpoints: track.checkpoints().to_vec(),
            track_width: track.config().width,
            chassis_size: vehicle.chassis_size,
            wheel_radius: vehicle.wheel_radius,
            wheel_width: vehicle.wheel_width,
        }
    }
}

/// Everything that moves, for one frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameView {
    pub view: Mat4,
    pub projection: Mat4,
    pub camera_position: Vec3,
    pub chassis: Transform,
    /// World-space wheel poses
    pub wheels: [Transform; 4],
    /// Seconds of unpaused play, wrapping at one hour
    pub elapsed: f32,
    pub paused: bool,
    pub speed: f32,
    pub lap: u32,
    pub next_checkpoint: usize,
    pub show_fps: bool,
}

/// World-space wheel poses for the vehicle's current transform
pub fn wheel_poses(vehicle: &Vehicle) -> [Transform; 4] {
    let chassis = Transform::from_position_rotation(vehicle.position(), vehicle.rotation());
    let wheels = *vehicle.wheels();
    wheels.map(|wheel| {
        Transform::from_position_rotation(
            chassis.position + chassis.rotation * wheel.offset,
            chassis.rotation * wheel.local_rotation(),
        )
    })
}

/// Presents frames
pub trait Renderer {
    /// Receive the static scene; called once before the first frame
    fn load_scene(&mut self, scene: &SceneGraph);

    /// Draw one frame
    fn render(&mut self, frame: &FrameView);

    /// Output surface changed size
    fn resize(&mut self, width: u32, height: u32);
}

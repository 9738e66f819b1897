//! Camera controller
//!
//! A three-mode state machine. The requested mode is applied at the start of
//! the next [`Camera::update`]: the active mode's state is torn down (free-fly
//! drops its mouse subscription), the new mode's state is built, and only then
//! does the frame's movement run.
//!
//! The camera looks down its local -Z axis, with +Y up.

use crate::config::CameraMode;
use crate::transform::{SharedTransform, Transform};
use circuit_input::{Command, InputState, MouseDelta, SubscriptionId};
use glam::{EulerRot, Mat3, Mat4, Quat, Vec3};
use parking_lot::RwLock;
use std::f32::consts::{FRAC_PI_2, PI};
use std::sync::{Arc, Weak};

/// Free-fly speed (units/s)
pub const FREE_FLY_SPEED: f32 = 10.0;
/// Eye height above the followed body
pub const FIRST_PERSON_OFFSET: Vec3 = Vec3::new(0.0, 1.8, 0.0);
/// Chase position relative to the followed body, in world axes
pub const THIRD_PERSON_OFFSET: Vec3 = Vec3::new(0.0, 3.0, -6.0);
/// Chase convergence rate (1/s)
pub const THIRD_PERSON_SMOOTHNESS: f32 = 5.0;

const NEAR: f32 = 0.1;
const FAR: f32 = 1000.0;

/// Free-fly look angles, written by the mouse subscriber
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LookAngles {
    pub yaw: f32,
    pub pitch: f32,
}

impl LookAngles {
    fn apply(&mut self, delta: MouseDelta, sensitivity: f32) {
        self.yaw -= delta.dx * sensitivity;
        self.pitch = (self.pitch - delta.dy * sensitivity).clamp(-FRAC_PI_2, FRAC_PI_2);
    }

    pub fn rotation(&self) -> Quat {
        Quat::from_euler(EulerRot::YXZ, self.yaw, self.pitch, 0.0)
    }
}

#[derive(Debug)]
struct FreeFly {
    look: Arc<RwLock<LookAngles>>,
    subscription: SubscriptionId,
    velocity: Vec3,
    speed: f32,
}

#[derive(Debug)]
enum ModeState {
    Free(FreeFly),
    FirstPerson { eye_offset: Vec3 },
    ThirdPerson { offset: Vec3, smoothness: f32 },
}

impl ModeState {
    fn mode(&self) -> CameraMode {
        match self {
            ModeState::Free(_) => CameraMode::Free,
            ModeState::FirstPerson { .. } => CameraMode::FirstPerson,
            ModeState::ThirdPerson { .. } => CameraMode::ThirdPerson,
        }
    }
}

/// Rotation whose -Z axis points along `direction`
fn facing(direction: Vec3) -> Option<Quat> {
    let forward = direction.try_normalize()?;
    let right = forward.cross(Vec3::Y).try_normalize()?;
    let up = right.cross(forward);
    Some(Quat::from_mat3(&Mat3::from_cols(right, up, -forward)))
}

/// The session's camera
///
/// First-person copies the target's look direction, not its quaternion:
/// the body's +Z maps onto the camera's -Z, so the camera rotation is the
/// target rotation turned half a revolution about Y.
#[derive(Debug)]
pub struct Camera {
    requested: CameraMode,
    state: ModeState,
    position: Vec3,
    rotation: Quat,
    target: Option<Weak<RwLock<Transform>>>,
    mouse_sensitivity: f32,
    fov_degrees: f32,
    aspect: f32,
    projection: Mat4,
}

impl Camera {
    /// Create a camera in `mode`. Free-fly subscribes to mouse deltas on `input`.
    pub fn new(mode: CameraMode, fov_degrees: f32, mouse_sensitivity: f32, input: &mut InputState) -> Self {
        let aspect = 16.0 / 9.0;
        let state = Self::init_state(mode, mouse_sensitivity, input);
        Self {
            requested: mode,
            state,
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            target: None,
            mouse_sensitivity,
            fov_degrees,
            aspect,
            projection: Mat4::perspective_rh(fov_degrees.to_radians(), aspect, NEAR, FAR),
        }
    }

    fn init_state(mode: CameraMode, sensitivity: f32, input: &mut InputState) -> ModeState {
        match mode {
            CameraMode::Free => {
                let look = Arc::new(RwLock::new(LookAngles::default()));
                let sink = Arc::clone(&look);
                let subscription =
                    input.subscribe_mouse_delta(move |delta| sink.write().apply(delta, sensitivity));
                ModeState::Free(FreeFly {
                    look,
                    subscription,
                    velocity: Vec3::ZERO,
                    speed: FREE_FLY_SPEED,
                })
            }
            CameraMode::FirstPerson => ModeState::FirstPerson {
                eye_offset: FIRST_PERSON_OFFSET,
            },
            CameraMode::ThirdPerson => ModeState::ThirdPerson {
                offset: THIRD_PERSON_OFFSET,
                smoothness: THIRD_PERSON_SMOOTHNESS,
            },
        }
    }

    fn teardown(&mut self, input: &mut InputState) {
        if let ModeState::Free(free) = &self.state {
            input.unsubscribe_mouse_delta(free.subscription);
        }
    }

    /// Request a mode; it takes effect on the next update
    pub fn set_mode(&mut self, mode: CameraMode) {
        self.requested = mode;
    }

    /// Mode currently applied
    pub fn mode(&self) -> CameraMode {
        self.state.mode()
    }

    /// Mode that will be applied on the next update
    pub fn requested_mode(&self) -> CameraMode {
        self.requested
    }

    /// Advance one frame
    pub fn update(&mut self, delta_time: f32, input: &mut InputState) {
        if self.requested != self.state.mode() {
            let from = self.state.mode();
            self.teardown(input);
            self.state = Self::init_state(self.requested, self.mouse_sensitivity, input);
            log::info!("Camera mode {} -> {}", from, self.requested);
        }

        let target = self.target_transform();
        match &mut self.state {
            ModeState::Free(free) => {
                self.rotation = free.look.read().rotation();

                let axis = |command: Command| if input.is_command_active(command) { 1.0 } else { 0.0 };
                let local = Vec3::new(
                    axis(Command::Right) - axis(Command::Left),
                    axis(Command::Handbrake) - axis(Command::Boost),
                    axis(Command::Backward) - axis(Command::Forward),
                );
                free.velocity = local.normalize_or_zero() * free.speed * delta_time;
                if free.velocity != Vec3::ZERO {
                    self.position += self.rotation * free.velocity;
                }
            }
            ModeState::FirstPerson { eye_offset } => {
                if let Some(target) = target {
                    self.position = target.position + *eye_offset;
                    // Bodies face +Z, the camera looks down -Z
                    self.rotation = target.rotation * Quat::from_rotation_y(PI);
                }
            }
            ModeState::ThirdPerson { offset, smoothness } => {
                if let Some(target) = target {
                    let desired = target.position + *offset;
                    let factor = (delta_time * *smoothness).min(1.0);
                    self.position = self.position.lerp(desired, factor);
                    if let Some(rotation) = facing(target.position - self.position) {
                        self.rotation = rotation;
                    }
                }
            }
        }
    }

    /// Release the mouse subscription, if any
    pub fn shutdown(&mut self, input: &mut InputState) {
        self.teardown(input);
        if let ModeState::Free(_) = self.state {
            self.state = Self::init_state(CameraMode::ThirdPerson, self.mouse_sensitivity, input);
            self.requested = CameraMode::ThirdPerson;
        }
    }

    /// Follow a transform without owning it
    pub fn set_target(&mut self, target: &SharedTransform) {
        self.target = Some(Arc::downgrade(target));
    }

    /// Current pose of the followed transform, if it is still alive
    pub fn target_transform(&self) -> Option<Transform> {
        self.target
            .as_ref()
            .and_then(Weak::upgrade)
            .map(|t| *t.read())
    }

    /// Follow offset of the active mode; `None` in free-fly
    pub fn offset(&self) -> Option<Vec3> {
        match &self.state {
            ModeState::Free(_) => None,
            ModeState::FirstPerson { eye_offset } => Some(*eye_offset),
            ModeState::ThirdPerson { offset, .. } => Some(*offset),
        }
    }

    /// Change the active mode's follow offset. Ignored in free-fly.
    pub fn set_offset(&mut self, value: Vec3) {
        match &mut self.state {
            ModeState::Free(_) => {}
            ModeState::FirstPerson { eye_offset } => *eye_offset = value,
            ModeState::ThirdPerson { offset, .. } => *offset = value,
        }
    }

    /// Free-fly look angles; `None` outside free-fly
    pub fn free_look(&self) -> Option<LookAngles> {
        match &self.state {
            ModeState::Free(free) => Some(*free.look.read()),
            _ => None,
        }
    }

    /// Last free-fly displacement; `None` outside free-fly
    pub fn free_velocity(&self) -> Option<Vec3> {
        match &self.state {
            ModeState::Free(free) => Some(free.velocity),
            _ => None,
        }
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    pub fn rotation(&self) -> Quat {
        self.rotation
    }

    /// View direction
    pub fn forward(&self) -> Vec3 {
        self.rotation * Vec3::NEG_Z
    }

    /// Turn to face a point. Ignored when the point is straight above or below.
    pub fn look_at(&mut self, point: Vec3) {
        if let Some(rotation) = facing(point - self.position) {
            self.rotation = rotation;
        }
    }

    /// Viewport changed size
    pub fn on_resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.aspect = width as f32 / height as f32;
        self.projection = Mat4::perspective_rh(self.fov_degrees.to_radians(), self.aspect, NEAR, FAR);
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    pub fn fov_degrees(&self) -> f32 {
        self.fov_degrees
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::from_rotation_translation(self.rotation, self.position).inverse()
    }

    pub fn projection_matrix(&self) -> Mat4 {
        self.projection
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection * self.view_matrix()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn target_at(position: Vec3) -> SharedTransform {
        Arc::new(RwLock::new(Transform::from_position_rotation(position, Quat::IDENTITY)))
    }

    #[test]
    fn test_free_fly_subscribes() {
        let mut input = InputState::default();
        let camera = Camera::new(CameraMode::Free, 90.0, 0.002, &mut input);
        assert_eq!(camera.mode(), CameraMode::Free);
        assert_eq!(input.mouse_subscriber_count(), 1);
        assert_eq!(camera.free_look(), Some(LookAngles::default()));
    }

    #[test]
    fn test_mouse_look_and_pitch_clamp() {
        let mut input = InputState::default();
        let mut camera = Camera::new(CameraMode::Free, 90.0, 0.01, &mut input);
        input.request_pointer_lock();

        input.mouse_motion(10.0, 0.0);
        let look = camera.free_look().unwrap();
        assert_relative_eq!(look.yaw, -0.1);

        input.mouse_motion(0.0, -1000.0);
        assert_relative_eq!(camera.free_look().unwrap().pitch, FRAC_PI_2);
        input.mouse_motion(0.0, 5000.0);
        assert_relative_eq!(camera.free_look().unwrap().pitch, -FRAC_PI_2);

        camera.update(0.016, &mut input);
        assert_eq!(camera.rotation(), camera.free_look().unwrap().rotation());
    }

    #[test]
    fn test_free_fly_moves_along_view() {
        let mut input = InputState::default();
        let mut camera = Camera::new(CameraMode::Free, 90.0, 0.002, &mut input);
        input.key_down("KeyW");
        camera.update(0.5, &mut input);
        assert!(camera.position().abs_diff_eq(Vec3::new(0.0, 0.0, -5.0), 1e-5));

        input.key_down("KeyD");
        camera.update(1.0, &mut input);
        let step = Vec3::new(1.0, 0.0, -1.0).normalize() * 10.0;
        assert!(camera.position().abs_diff_eq(Vec3::new(0.0, 0.0, -5.0) + step, 1e-4));
    }

    #[test]
    fn test_free_fly_vertical_keys() {
        let mut input = InputState::default();
        let mut camera = Camera::new(CameraMode::Free, 90.0, 0.002, &mut input);
        input.key_down("Space");
        camera.update(0.1, &mut input);
        assert!(camera.position().abs_diff_eq(Vec3::new(0.0, 1.0, 0.0), 1e-5));

        input.key_up("Space");
        input.key_down("ShiftLeft");
        camera.update(0.2, &mut input);
        assert!(camera.position().abs_diff_eq(Vec3::new(0.0, -1.0, 0.0), 1e-5));
    }

    #[test]
    fn test_first_person_is_rigid() {
        let mut input = InputState::default();
        let mut camera = Camera::new(CameraMode::FirstPerson, 90.0, 0.002, &mut input);
        let target = target_at(Vec3::new(3.0, 0.5, 7.0));
        target.write().rotation = Quat::from_rotation_y(0.7);
        camera.set_target(&target);

        camera.update(0.016, &mut input);
        assert!(camera.position().abs_diff_eq(Vec3::new(3.0, 2.3, 7.0), 1e-6));
        let target_forward = Quat::from_rotation_y(0.7) * Vec3::Z;
        assert!(camera.forward().abs_diff_eq(target_forward, 1e-5));
        let expected = Quat::from_rotation_y(0.7) * Quat::from_rotation_y(PI);
        assert!(camera.rotation().abs_diff_eq(expected, 1e-5));
    }

    #[test]
    fn test_third_person_converges_and_looks_at_target() {
        let mut input = InputState::default();
        let mut camera = Camera::new(CameraMode::ThirdPerson, 90.0, 0.002, &mut input);
        let target = target_at(Vec3::new(10.0, 0.0, 10.0));
        camera.set_target(&target);

        let desired = Vec3::new(10.0, 3.0, 4.0);
        let mut last = camera.position().distance(desired);
        for _ in 0..120 {
            camera.update(1.0 / 60.0, &mut input);
            let d = camera.position().distance(desired);
            assert!(d < last);
            last = d;
        }
        assert!(last < 0.1);

        let to_target = (Vec3::new(10.0, 0.0, 10.0) - camera.position()).normalize();
        assert!(camera.forward().abs_diff_eq(to_target, 1e-4));
    }

    #[test]
    fn test_third_person_large_delta_does_not_overshoot() {
        let mut input = InputState::default();
        let mut camera = Camera::new(CameraMode::ThirdPerson, 90.0, 0.002, &mut input);
        let target = target_at(Vec3::ZERO);
        camera.set_target(&target);
        camera.update(1.0, &mut input);
        assert!(camera.position().abs_diff_eq(THIRD_PERSON_OFFSET, 1e-6));
    }

    #[test]
    fn test_switch_free_to_third_person() {
        let mut input = InputState::default();
        input.request_pointer_lock();
        let mut camera = Camera::new(CameraMode::Free, 90.0, 0.002, &mut input);
        input.mouse_motion(100.0, 50.0);
        input.key_down("KeyW");
        camera.update(0.1, &mut input);
        assert!(camera.free_velocity().is_some());

        let target = target_at(Vec3::new(20.0, 0.0, 20.0));
        camera.set_target(&target);
        camera.set_mode(CameraMode::ThirdPerson);
        assert_eq!(camera.mode(), CameraMode::Free);

        let before = camera.position();
        let desired = Vec3::new(20.0, 3.0, 14.0);
        camera.update(0.1, &mut input);

        assert_eq!(camera.mode(), CameraMode::ThirdPerson);
        assert_eq!(camera.free_look(), None);
        assert_eq!(camera.free_velocity(), None);
        assert_eq!(input.mouse_subscriber_count(), 0);
        assert!(camera.position().distance(desired) < before.distance(desired));
        assert!(camera.position().abs_diff_eq(before.lerp(desired, 0.5), 1e-5));
    }

    #[test]
    fn test_reentering_free_fly_starts_fresh() {
        let mut input = InputState::default();
        input.request_pointer_lock();
        let mut camera = Camera::new(CameraMode::Free, 90.0, 0.002, &mut input);
        input.mouse_motion(300.0, 0.0);

        camera.set_mode(CameraMode::FirstPerson);
        camera.update(0.016, &mut input);
        camera.set_mode(CameraMode::Free);
        camera.update(0.016, &mut input);

        assert_eq!(camera.free_look(), Some(LookAngles::default()));
        assert_eq!(input.mouse_subscriber_count(), 1);
    }

    #[test]
    fn test_dropped_target_holds_position() {
        let mut input = InputState::default();
        let mut camera = Camera::new(CameraMode::ThirdPerson, 90.0, 0.002, &mut input);
        camera.set_position(Vec3::new(1.0, 2.0, 3.0));
        {
            let target = target_at(Vec3::new(50.0, 0.0, 0.0));
            camera.set_target(&target);
        }
        assert!(camera.target_transform().is_none());
        camera.update(0.1, &mut input);
        assert_eq!(camera.position(), Vec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn test_offset_per_mode() {
        let mut input = InputState::default();
        let mut camera = Camera::new(CameraMode::ThirdPerson, 90.0, 0.002, &mut input);
        assert_eq!(camera.offset(), Some(THIRD_PERSON_OFFSET));
        camera.set_offset(Vec3::new(0.0, 5.0, -10.0));
        assert_eq!(camera.offset(), Some(Vec3::new(0.0, 5.0, -10.0)));

        camera.set_mode(CameraMode::FirstPerson);
        camera.update(0.0, &mut input);
        assert_eq!(camera.offset(), Some(FIRST_PERSON_OFFSET));

        camera.set_mode(CameraMode::Free);
        camera.update(0.0, &mut input);
        assert_eq!(camera.offset(), None);
    }

    #[test]
    fn test_resize_updates_projection() {
        let mut input = InputState::default();
        let mut camera = Camera::new(CameraMode::ThirdPerson, 90.0, 0.002, &mut input);
        let before = camera.projection_matrix();
        camera.on_resize(800, 800);
        assert_relative_eq!(camera.aspect(), 1.0);
        assert_ne!(camera.projection_matrix(), before);

        camera.on_resize(0, 600);
        assert_relative_eq!(camera.aspect(), 1.0);
    }

    #[test]
    fn test_look_at_and_view_matrix() {
        let mut input = InputState::default();
        let mut camera = Camera::new(CameraMode::ThirdPerson, 90.0, 0.002, &mut input);
        camera.set_position(Vec3::new(0.0, 0.0, 10.0));
        camera.look_at(Vec3::ZERO);
        assert!(camera.forward().abs_diff_eq(Vec3::NEG_Z, 1e-6));

        let origin_in_view = camera.view_matrix().transform_point3(Vec3::ZERO);
        assert!(origin_in_view.abs_diff_eq(Vec3::new(0.0, 0.0, -10.0), 1e-5));
    }

    #[test]
    fn test_shutdown_releases_subscription() {
        let mut input = InputState::default();
        let mut camera = Camera::new(CameraMode::Free, 90.0, 0.002, &mut input);
        camera.shutdown(&mut input);
        assert_eq!(input.mouse_subscriber_count(), 0);
    }
}

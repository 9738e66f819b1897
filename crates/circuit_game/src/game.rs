//! Session orchestrator
//!
//! Owns one physics world, one track, one vehicle and one camera, and runs
//! them in a fixed order each frame:
//!
//! ```text
//!   commands (exit / pause / change-camera, each cleared once handled)
//!      │
//!      ▼  running only
//!   vehicle.update ─► camera.update ─► physics.step ─► contacts / respawn / laps ─► clock
//! ```

use crate::camera::{Camera, THIRD_PERSON_OFFSET};
use crate::config::{CameraMode, GameConfig};
use crate::error::Result;
use crate::game_loop::{FrameHandler, LoopControl};
use crate::render::{wheel_poses, FrameView, Renderer, SceneGraph};
use crate::track::{Track, BARRIER_TAG};
use crate::transform::Transform;
use crate::vehicle::{Vehicle, VEHICLE_TAG};
use circuit_input::{Command, InputState, VehicleControls};
use circuit_physics::PhysicsWorld;
use glam::{Vec2, Vec3};

/// The vehicle is put back on the start line below this height
pub const RESPAWN_DEPTH: f32 = -20.0;
/// The elapsed-time counter wraps here (seconds)
pub const ELAPSED_WRAP: f32 = 3600.0;

/// Session lifecycle
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    Running,
    Paused,
    /// Exit was requested; the loop should stop
    Exited,
}

/// Checkpoint-to-checkpoint lap counter
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LapProgress {
    next_checkpoint: usize,
    laps: u32,
    reach: f32,
}

impl LapProgress {
    fn new(checkpoints: usize, reach: f32) -> Self {
        Self {
            next_checkpoint: if checkpoints > 0 { 1 % checkpoints } else { 0 },
            laps: 0,
            reach,
        }
    }

    /// Index of the checkpoint to reach next
    pub fn next_checkpoint(&self) -> usize {
        self.next_checkpoint
    }

    /// Completed laps
    pub fn laps(&self) -> u32 {
        self.laps
    }

    /// Returns true when a checkpoint was reached
    fn advance(&mut self, position: Vec3, track: &Track) -> bool {
        let checkpoints = track.checkpoints();
        let Some(next) = checkpoints.get(self.next_checkpoint) else {
            return false;
        };
        let flat = |v: Vec3| Vec2::new(v.x, v.z);
        if flat(position).distance(flat(next.position)) > self.reach {
            return false;
        }

        log::debug!("Checkpoint {} reached", next.index);
        if next.index == 0 {
            self.laps += 1;
            log::info!("Lap {} complete", self.laps);
        }
        self.next_checkpoint = (self.next_checkpoint + 1) % checkpoints.len();
        true
    }
}

/// A running session
pub struct Game<R: Renderer> {
    config: GameConfig,
    physics: PhysicsWorld,
    input: InputState,
    track: Track,
    vehicle: Vehicle,
    camera: Camera,
    renderer: R,
    state: SessionState,
    elapsed: f32,
    progress: LapProgress,
    barrier_hits: u64,
    respawns: u32,
}

impl<R: Renderer> std::fmt::Debug for Game<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Game")
            .field("state", &self.state)
            .field("elapsed", &self.elapsed)
            .field("camera_mode", &self.camera.mode())
            .field("progress", &self.progress)
            .finish()
    }
}

impl<R: Renderer> Game<R> {
    /// Build the world and hand the static scene to `renderer`.
    ///
    /// Fails if the configuration is invalid or physics cannot start; no
    /// partial session is returned.
    pub fn new(config: GameConfig, mut renderer: R) -> Result<Self> {
        config.validate()?;

        let mut physics = PhysicsWorld::new(config.physics.clone());
        physics.initialize()?;

        let track = Track::new(&mut physics, config.track.clone())?;
        let vehicle = Vehicle::spawn(
            &mut physics,
            track.start_position(),
            track.start_heading(),
            config.vehicle.clone(),
        )?;

        let mut input = InputState::new(config.bindings.clone());
        let mut camera = Camera::new(config.camera_mode, config.fov, config.mouse_sensitivity, &mut input);
        camera.set_target(&vehicle.shared_transform());
        camera.set_position(track.start_position() + THIRD_PERSON_OFFSET);
        camera.look_at(track.start_position());
        input.request_pointer_lock();

        renderer.load_scene(&SceneGraph::build(
            config.physics.ground_half_extents,
            &track,
            &config.vehicle,
        ));

        let progress = LapProgress::new(track.checkpoints().len(), config.track.width);
        log::info!("Session ready, camera {}", config.camera_mode);

        Ok(Self {
            config,
            physics,
            input,
            track,
            vehicle,
            camera,
            renderer,
            state: SessionState::Running,
            elapsed: 0.0,
            progress,
            barrier_hits: 0,
            respawns: 0,
        })
    }

    /// Advance one frame
    pub fn update(&mut self, delta_time: f32) -> LoopControl {
        let dt = if delta_time.is_finite() {
            delta_time.clamp(0.0, self.config.max_frame_delta)
        } else {
            0.0
        };

        if self.state == SessionState::Exited {
            return LoopControl::Stop;
        }
        if self.input.is_command_active(Command::Exit) {
            self.input.unset_command(Command::Exit);
            self.exit();
            return LoopControl::Stop;
        }
        if self.input.is_command_active(Command::Pause) {
            self.input.unset_command(Command::Pause);
            match self.state {
                SessionState::Running => self.pause(),
                _ => self.resume(),
            }
        }
        if self.input.is_command_active(Command::ChangeCamera) {
            self.input.unset_command(Command::ChangeCamera);
            let next = self.config.camera_mode.next();
            self.config.camera_mode = next;
            self.camera.set_mode(next);
        }

        if self.state == SessionState::Running {
            match self.simulate(dt) {
                Ok(()) => self.elapsed = (self.elapsed + dt) % ELAPSED_WRAP,
                Err(e) => log::error!("Simulation step failed: {}", e),
            }
        }
        LoopControl::Continue
    }

    fn simulate(&mut self, dt: f32) -> Result<()> {
        let controls = if self.camera.requested_mode() == CameraMode::Free {
            VehicleControls::NEUTRAL
        } else {
            VehicleControls::from_input(&self.input)
        };

        self.vehicle.update(&mut self.physics, dt, controls)?;
        self.camera.update(dt, &mut self.input);
        if dt > 0.0 {
            self.physics.step(dt);
        }

        for event in self.physics.collision_events() {
            if event.is_started() && event.other(VEHICLE_TAG) == Some(BARRIER_TAG) {
                self.barrier_hits += 1;
                log::debug!("Barrier contact #{} at speed {:.1}", self.barrier_hits, self.vehicle.speed());
            }
        }

        if self.vehicle.position().y < RESPAWN_DEPTH {
            self.respawns += 1;
            log::warn!("Vehicle fell out of the world, respawning at start");
            self.vehicle
                .reset_to(&mut self.physics, self.track.start_position(), self.track.start_heading())?;
            self.progress = LapProgress::new(self.track.checkpoints().len(), self.config.track.width);
        }

        self.progress.advance(self.vehicle.position(), &self.track);
        Ok(())
    }

    /// Present the current state
    pub fn render(&mut self) {
        let frame = FrameView {
            view: self.camera.view_matrix(),
            projection: self.camera.projection_matrix(),
            camera_position: self.camera.position(),
            chassis: Transform::from_position_rotation(self.vehicle.position(), self.vehicle.rotation()),
            wheels: wheel_poses(&self.vehicle),
            elapsed: self.elapsed,
            paused: self.state == SessionState::Paused,
            speed: self.vehicle.speed(),
            lap: self.progress.laps(),
            next_checkpoint: self.progress.next_checkpoint(),
            show_fps: self.config.show_fps,
        };
        self.renderer.render(&frame);
    }

    /// Output surface changed size
    pub fn resize(&mut self, width: u32, height: u32) {
        self.camera.on_resize(width, height);
        self.renderer.resize(width, height);
    }

    pub fn pause(&mut self) {
        if self.state != SessionState::Running {
            return;
        }
        self.state = SessionState::Paused;
        self.input.exit_pointer_lock();
        log::info!("Paused at {:.1}s", self.elapsed);
    }

    pub fn resume(&mut self) {
        if self.state != SessionState::Paused {
            return;
        }
        self.state = SessionState::Running;
        self.input.request_pointer_lock();
        log::info!("Resumed");
    }

    /// End the session; the next update returns [`LoopControl::Stop`]
    pub fn exit(&mut self) {
        if self.state == SessionState::Exited {
            return;
        }
        self.state = SessionState::Exited;
        self.input.exit_pointer_lock();
        self.camera.shutdown(&mut self.input);
        log::info!(
            "Session ended after {:.1}s, {} laps, {} barrier contacts",
            self.elapsed,
            self.progress.laps(),
            self.barrier_hits
        );
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_paused(&self) -> bool {
        self.state == SessionState::Paused
    }

    /// Seconds of unpaused play, wrapping at one hour
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn input(&self) -> &InputState {
        &self.input
    }

    /// Feed device events here
    pub fn input_mut(&mut self) -> &mut InputState {
        &mut self.input
    }

    pub fn physics(&self) -> &PhysicsWorld {
        &self.physics
    }

    pub fn track(&self) -> &Track {
        &self.track
    }

    pub fn vehicle(&self) -> &Vehicle {
        &self.vehicle
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn progress(&self) -> &LapProgress {
        &self.progress
    }

    pub fn barrier_hits(&self) -> u64 {
        self.barrier_hits
    }

    pub fn respawns(&self) -> u32 {
        self.respawns
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }
}

impl<R: Renderer> FrameHandler for Game<R> {
    fn update(&mut self, delta_time: f32) -> LoopControl {
        Game::update(self, delta_time)
    }

    fn render(&mut self) {
        Game::render(self)
    }
}

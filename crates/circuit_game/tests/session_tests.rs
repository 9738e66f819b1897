//! Session tests for circuit_game
//!
//! Whole sessions driven through the frame loop with a recording renderer.

use circuit_game::*;
use std::time::Duration;

const DT: f32 = 1.0 / 60.0;

#[derive(Default)]
struct RecordingRenderer {
    scene: Option<SceneGraph>,
    frames: Vec<FrameView>,
    resizes: Vec<(u32, u32)>,
}

impl Renderer for RecordingRenderer {
    fn load_scene(&mut self, scene: &SceneGraph) {
        self.scene = Some(scene.clone());
    }

    fn render(&mut self, frame: &FrameView) {
        self.frames.push(*frame);
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.resizes.push((width, height));
    }
}

fn session(config: GameConfig) -> Game<RecordingRenderer> {
    Game::new(config, RecordingRenderer::default()).expect("session should start")
}

#[test]
fn test_throttle_drives_car_along_start_heading() {
    let mut game = session(GameConfig::default());
    let start = game.track().start_position();
    let heading = transform::yaw_rotation(game.track().start_heading()) * glam::Vec3::Z;

    game.input_mut().key_down("KeyW");
    for _ in 0..120 {
        game.update(DT);
    }

    let vehicle = game.vehicle();
    assert!(vehicle.forward_speed() > 0.0);
    assert!(vehicle.speed() <= vehicle.config().max_speed);
    assert!((vehicle.position() - start).dot(heading) > 0.0);
    assert_eq!(game.respawns(), 0);
}

#[test]
fn test_scene_loaded_once() {
    let game = session(GameConfig::default());
    let scene = game.renderer().scene.as_ref().expect("scene loaded");

    assert_eq!(scene.checkpoints.len(), 5);
    assert_eq!(scene.barriers.len(), 200);
    assert_eq!(scene.road.triangle_count(), 200);
    assert_eq!(scene.center_line.len(), 201);
    assert_eq!(scene.track_width, 8.0);
    assert_eq!(scene.ground_half_extents, config::GROUND_HALF_EXTENTS);
}

#[test]
fn test_loop_drives_session_until_exit() {
    let mut game = session(GameConfig::default());
    let mut game_loop = GameLoop::new();
    let mut now = Duration::ZERO;
    assert!(game_loop.start(now));

    for _ in 0..30 {
        now += Duration::from_millis(16);
        assert!(game_loop.frame(now, &mut game));
    }
    assert_eq!(game.renderer().frames.len(), 30);
    assert!(game.elapsed() > 0.4);

    game.input_mut().key_down("Escape");
    now += Duration::from_millis(16);
    assert!(!game_loop.frame(now, &mut game));
    assert!(!game_loop.is_running());
    assert_eq!(game.state(), SessionState::Exited);

    // The exit frame is still presented, nothing after it
    assert_eq!(game.renderer().frames.len(), 31);
    assert!(!game_loop.frame(now + Duration::from_millis(16), &mut game));
    assert_eq!(game.renderer().frames.len(), 31);
}

#[test]
fn test_hitch_is_capped_by_session() {
    let mut game = session(GameConfig::default());
    let mut game_loop = GameLoop::new();
    game_loop.start(Duration::ZERO);
    game_loop.frame(Duration::from_secs(3), &mut game);

    assert_eq!(game_loop.time().delta, 3.0);
    assert!((game.elapsed() - game.config().max_frame_delta).abs() < 1e-6);
}

#[test]
fn test_frames_report_pause_and_progress() {
    let mut game = session(GameConfig::default().with_show_fps(false));
    game.update(DT);
    game.render();

    game.input_mut().key_down("KeyP");
    game.update(DT);
    game.render();

    let frames = &game.renderer().frames;
    assert!(!frames[0].paused);
    assert!(frames[1].paused);
    assert_eq!(frames[1].elapsed, frames[0].elapsed);
    assert_eq!(frames[1].lap, 0);
    assert_eq!(frames[1].next_checkpoint, 1);
    assert!(!frames[1].show_fps);
}

#[test]
fn test_frame_wheels_follow_chassis() {
    let mut game = session(GameConfig::default());
    for _ in 0..10 {
        game.update(DT);
    }
    game.render();

    let frame = game.renderer().frames[0];
    let config = game.vehicle().config();
    for wheel in frame.wheels {
        let local = frame.chassis.rotation.inverse() * (wheel.position - frame.chassis.position);
        assert!((local.x.abs() - config.track_width / 2.0).abs() < 1e-4);
        assert!((local.z.abs() - config.wheel_base / 2.0).abs() < 1e-4);
    }
}

#[test]
fn test_resize_reaches_camera_and_renderer() {
    let mut game = session(GameConfig::default());
    game.resize(1920, 1080);
    game.resize(0, 0);

    assert!((game.camera().aspect() - 1920.0 / 1080.0).abs() < 1e-6);
    assert_eq!(game.renderer().resizes, vec![(1920, 1080), (0, 0)]);
}

#[test]
fn test_camera_cycle_through_session() {
    let mut game = session(GameConfig::default());
    let mut seen = Vec::new();
    for _ in 0..3 {
        game.input_mut().key_down("KeyC");
        game.update(DT);
        game.input_mut().key_up("KeyC");
        seen.push(game.camera().mode());
    }
    assert_eq!(
        seen,
        vec![CameraMode::FirstPerson, CameraMode::Free, CameraMode::ThirdPerson]
    );
    assert_eq!(game.input().mouse_subscriber_count(), 0);
}

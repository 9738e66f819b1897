//! Headless presentation and scripted input
//!
//! Stands in for a window: frames are counted instead of drawn, and key
//! presses come from a timeline instead of a keyboard.

use circuit_game::{FrameView, Renderer, SceneGraph};
use circuit_input::InputState;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

const FPS_WINDOW: Duration = Duration::from_secs(1);

/// Counts frames and reports the rate
#[derive(Debug)]
pub struct HeadlessRenderer {
    show_fps: bool,
    frames: u64,
    window_start: Option<Instant>,
    window_frames: u32,
    last_fps: Option<f32>,
    size: (u32, u32),
}

impl HeadlessRenderer {
    pub fn new(show_fps: bool) -> Self {
        Self {
            show_fps,
            frames: 0,
            window_start: None,
            window_frames: 0,
            last_fps: None,
            size: (0, 0),
        }
    }

    /// Count a frame presented at `now`. Returns the rate when a
    /// one-second window closes.
    pub fn tick(&mut self, now: Instant) -> Option<f32> {
        self.frames += 1;
        self.window_frames += 1;

        let start = *self.window_start.get_or_insert(now);
        let span = now.saturating_duration_since(start);
        if span < FPS_WINDOW {
            return None;
        }

        let fps = self.window_frames as f32 / span.as_secs_f32();
        self.window_start = Some(now);
        self.window_frames = 0;
        self.last_fps = Some(fps);
        Some(fps)
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn last_fps(&self) -> Option<f32> {
        self.last_fps
    }

    pub fn size(&self) -> (u32, u32) {
        self.size
    }
}

impl Renderer for HeadlessRenderer {
    fn load_scene(&mut self, scene: &SceneGraph) {
        log::info!(
            "Scene: {} road triangles, {} barriers, {} checkpoints",
            scene.road.triangle_count(),
            scene.barriers.len(),
            scene.checkpoints.len()
        );
    }

    fn render(&mut self, frame: &FrameView) {
        let show = self.show_fps && frame.show_fps;
        if let Some(fps) = self.tick(Instant::now()) {
            if show {
                log::info!(
                    "FPS: {:.0} | {:.1} m/s | lap {} | next checkpoint {}{}",
                    fps,
                    frame.speed,
                    frame.lap,
                    frame.next_checkpoint,
                    if frame.paused { " | paused" } else { "" }
                );
            }
        }
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.size = (width, height);
        log::debug!("Output resized to {}x{}", width, height);
    }
}

/// One key transition at a point on the session clock
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptEvent {
    /// Seconds since the loop started
    pub at: f32,
    /// Physical key code, e.g. `KeyW`
    pub code: String,
    pub pressed: bool,
}

impl ScriptEvent {
    pub fn new(at: f32, code: impl Into<String>, pressed: bool) -> Self {
        Self {
            at,
            code: code.into(),
            pressed,
        }
    }
}

/// Drive forward and visit every camera mode
pub fn default_script() -> Vec<ScriptEvent> {
    let mut script = vec![ScriptEvent::new(0.0, "KeyW", true)];
    for at in [5.0, 10.0, 15.0] {
        script.push(ScriptEvent::new(at, "KeyC", true));
        script.push(ScriptEvent::new(at + 0.1, "KeyC", false));
    }
    script
}

/// Replays a script in time order
#[derive(Debug, Clone)]
pub struct ScriptPlayer {
    events: Vec<ScriptEvent>,
    cursor: usize,
}

impl ScriptPlayer {
    pub fn new(mut events: Vec<ScriptEvent>) -> Self {
        events.retain(|e| e.at.is_finite());
        events.sort_by(|a, b| a.at.total_cmp(&b.at));
        Self { events, cursor: 0 }
    }

    /// Feed every event due at `time` into `input`. Returns how many fired.
    pub fn apply(&mut self, time: f32, input: &mut InputState) -> usize {
        let mut fired = 0;
        while let Some(event) = self.events.get(self.cursor) {
            if event.at > time {
                break;
            }
            if event.pressed {
                input.key_down(&event.code);
            } else {
                input.key_up(&event.code);
            }
            log::debug!(
                "Script {:.2}s: {} {}",
                event.at,
                event.code,
                if event.pressed { "down" } else { "up" }
            );
            self.cursor += 1;
            fired += 1;
        }
        fired
    }

    pub fn remaining(&self) -> usize {
        self.events.len() - self.cursor
    }
}

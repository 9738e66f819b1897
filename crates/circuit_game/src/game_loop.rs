//! Update-then-render frame loop
//!
//! The loop does not own a clock. The host calls [`GameLoop::frame`] with the
//! current time whenever the display is ready; the loop measures the delta
//! since the previous frame, runs `update(dt)` then `render()`, and schedules
//! the next frame unless it was stopped.

use std::time::Duration;

/// What the update asks the loop to do next
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoopControl {
    Continue,
    /// Finish this frame, then schedule nothing
    Stop,
}

/// Per-frame callbacks
pub trait FrameHandler {
    /// Advance the simulation by `delta_time` seconds
    fn update(&mut self, delta_time: f32) -> LoopControl;

    /// Present the current state
    fn render(&mut self);
}

/// Frame timing information
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FrameTime {
    /// Delta time of the last frame in seconds
    pub delta: f32,
    /// Total measured time in seconds
    pub total: f64,
    /// Frames run since start
    pub frame: u64,
}

/// Drives a [`FrameHandler`]
#[derive(Debug, Default)]
pub struct GameLoop {
    running: bool,
    pending: bool,
    last: Duration,
    time: FrameTime,
}

impl GameLoop {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start measuring from `now` and schedule the first frame.
    /// Returns false if already running.
    pub fn start(&mut self, now: Duration) -> bool {
        if self.running {
            return false;
        }
        self.running = true;
        self.pending = true;
        self.last = now;
        log::debug!("Game loop started");
        true
    }

    /// Stop and cancel the scheduled frame, if any
    pub fn stop(&mut self) {
        if self.running {
            log::debug!("Game loop stopped after {} frames", self.time.frame);
        }
        self.running = false;
        self.pending = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// A frame is scheduled
    pub fn is_pending(&self) -> bool {
        self.pending
    }

    pub fn frame_count(&self) -> u64 {
        self.time.frame
    }

    pub fn time(&self) -> &FrameTime {
        &self.time
    }

    /// Run the scheduled frame at `now`. Returns whether another frame is
    /// scheduled; does nothing and returns false when nothing was scheduled.
    pub fn frame<H: FrameHandler + ?Sized>(&mut self, now: Duration, handler: &mut H) -> bool {
        if !self.pending {
            return false;
        }
        self.pending = false;

        let delta = now.saturating_sub(self.last).as_secs_f32();
        self.last = now;
        self.time.delta = delta;
        self.time.total += delta as f64;
        self.time.frame += 1;

        let control = handler.update(delta);
        handler.render();

        if control == LoopControl::Stop {
            self.stop();
        } else {
            self.pending = true;
        }
        self.pending
    }
}

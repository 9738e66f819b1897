//! Circuit Game
//!
//! The per-frame core of a single-player driving game: one car, one closed
//! track, one camera, one physics world.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │                        Game<R: Renderer>                   │
//! │  ┌──────────┐  ┌─────────┐  ┌─────────┐  ┌──────────────┐  │
//! │  │InputState│  │ Vehicle │  │  Track  │  │    Camera    │  │
//! │  └────┬─────┘  └────┬────┘  └────┬────┘  └──────┬───────┘  │
//! │       │ controls    │ forces     │ barriers     │ Weak     │
//! │       ▼             ▼            ▼              │ target   │
//! │                ┌──────────────────┐             │          │
//! │                │   PhysicsWorld   │◄────────────┘          │
//! │                └──────────────────┘   (via vehicle pose)   │
//! └────────────────────────────────────────────────────────────┘
//!                 ▲ frame(now)
//!            GameLoop (host clock)
//! ```
//!
//! Everything is owned by [`Game`] and passed by reference; there are no
//! globals. The host owns the clock and the window and drives
//! [`GameLoop::frame`].

pub mod camera;
pub mod config;
pub mod error;
pub mod game;
pub mod game_loop;
pub mod render;
pub mod track;
pub mod transform;
pub mod vehicle;

pub mod prelude {
    pub use crate::camera::{Camera, LookAngles};
    pub use crate::config::{CameraMode, GameConfig};
    pub use crate::error::{GameError, Result};
    pub use crate::game::{Game, LapProgress, SessionState};
    pub use crate::game_loop::{FrameHandler, FrameTime, GameLoop, LoopControl};
    pub use crate::render::{FrameView, Renderer, SceneGraph};
    pub use crate::track::{Checkpoint, Track, TrackConfig, TrackCurve};
    pub use crate::transform::{SharedTransform, Transform};
    pub use crate::vehicle::{Vehicle, VehicleConfig, Wheel};
}

pub use prelude::*;

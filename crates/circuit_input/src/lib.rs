//! Circuit Input
//!
//! Raw device events go in, logical commands come out. The game never looks
//! at physical key codes; it asks whether a [`Command`] is active.
//!
//! Commands are level-triggered: a command stays active while its key is held.
//! Consumers that want one action per press (pause, camera change) clear the
//! command with [`InputState::unset_command`] after acting on it. Auto-repeat
//! presses of a held key do not re-arm it.
//!
//! Mouse motion is fanned out synchronously to subscribers registered with
//! [`InputState::subscribe_mouse_delta`], but only while the pointer is locked.

pub mod bindings;
pub mod command;
pub mod controls;
pub mod error;
pub mod state;

pub use bindings::Bindings;
pub use command::Command;
pub use controls::VehicleControls;
pub use error::{InputError, Result};
pub use state::{InputState, MouseDelta, SubscriptionId};

//! Held-key tracking, command state and the mouse-delta observer list

use crate::bindings::Bindings;
use crate::command::Command;
use std::collections::HashSet;

/// Relative mouse motion in pixels
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MouseDelta {
    pub dx: f32,
    pub dy: f32,
}

impl MouseDelta {
    pub fn new(dx: f32, dy: f32) -> Self {
        Self { dx, dy }
    }
}

/// Token returned by [`InputState::subscribe_mouse_delta`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    /// Get raw ID value
    pub fn raw(&self) -> u64 {
        self.0
    }
}

type MouseCallback = Box<dyn FnMut(MouseDelta) + Send>;

struct Subscriber {
    id: SubscriptionId,
    callback: MouseCallback,
}

/// Device input state for one session
pub struct InputState {
    bindings: Bindings,
    held: HashSet<String>,
    active: [bool; Command::ALL.len()],
    last_pressed: Option<String>,
    pointer_locked: bool,
    subscribers: Vec<Subscriber>,
    next_subscription: u64,
}

impl std::fmt::Debug for InputState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InputState")
            .field("held", &self.held)
            .field("active", &self.active)
            .field("last_pressed", &self.last_pressed)
            .field("pointer_locked", &self.pointer_locked)
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

impl Default for InputState {
    fn default() -> Self {
        Self::new(Bindings::default())
    }
}

impl InputState {
    pub fn new(bindings: Bindings) -> Self {
        Self {
            bindings,
            held: HashSet::new(),
            active: [false; Command::ALL.len()],
            last_pressed: None,
            pointer_locked: false,
            subscribers: Vec::new(),
            next_subscription: 1,
        }
    }

    pub fn bindings(&self) -> &Bindings {
        &self.bindings
    }

    /// Physical key pressed. Repeats of an already-held key are ignored.
    pub fn key_down(&mut self, code: &str) {
        if !self.held.insert(code.to_string()) {
            return;
        }
        self.last_pressed = Some(code.to_string());
        if let Some(command) = self.bindings.command_for(code) {
            log::trace!("{} -> {}", code, command);
            self.active[command.index()] = true;
        }
    }

    /// Physical key released
    pub fn key_up(&mut self, code: &str) {
        self.held.remove(code);
        if let Some(command) = self.bindings.command_for(code) {
            // Another held code may still drive the same command
            let still_held = self
                .held
                .iter()
                .any(|c| self.bindings.command_for(c) == Some(command));
            if !still_held {
                self.active[command.index()] = false;
            }
        }
    }

    /// Mouse button pressed, bound as `Mouse<n>`
    pub fn mouse_button_down(&mut self, button: u8) {
        self.key_down(&format!("Mouse{}", button));
    }

    /// Mouse button released
    pub fn mouse_button_up(&mut self, button: u8) {
        self.key_up(&format!("Mouse{}", button));
    }

    /// Whether a physical code is currently held
    pub fn is_held(&self, code: &str) -> bool {
        self.held.contains(code)
    }

    /// Most recently pressed physical code
    pub fn last_pressed(&self) -> Option<&str> {
        self.last_pressed.as_deref()
    }

    pub fn is_command_active(&self, command: Command) -> bool {
        self.active[command.index()]
    }

    /// Clear a command after acting on it. It stays clear until its key is
    /// released and pressed again.
    pub fn unset_command(&mut self, command: Command) {
        self.active[command.index()] = false;
    }

    /// Window lost focus: release everything
    pub fn focus_lost(&mut self) {
        self.held.clear();
        self.active = [false; Command::ALL.len()];
    }

    pub fn request_pointer_lock(&mut self) {
        if !self.pointer_locked {
            log::debug!("Pointer locked");
        }
        self.pointer_locked = true;
    }

    pub fn exit_pointer_lock(&mut self) {
        if self.pointer_locked {
            log::debug!("Pointer released");
        }
        self.pointer_locked = false;
    }

    pub fn is_pointer_locked(&self) -> bool {
        self.pointer_locked
    }

    /// Register a mouse-delta callback
    pub fn subscribe_mouse_delta<F>(&mut self, callback: F) -> SubscriptionId
    where
        F: FnMut(MouseDelta) + Send + 'static,
    {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.subscribers.push(Subscriber {
            id,
            callback: Box::new(callback),
        });
        id
    }

    /// Remove a callback. Returns false if it was already removed.
    pub fn unsubscribe_mouse_delta(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|s| s.id != id);
        self.subscribers.len() != before
    }

    pub fn mouse_subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Relative mouse motion. Subscribers run immediately, in subscription
    /// order, and only while the pointer is locked.
    pub fn mouse_motion(&mut self, dx: f32, dy: f32) {
        if !self.pointer_locked {
            return;
        }
        let delta = MouseDelta::new(dx, dy);
        for subscriber in &mut self.subscribers {
            (subscriber.callback)(delta);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_command_follows_key() {
        let mut input = InputState::default();
        assert!(!input.is_command_active(Command::Forward));

        input.key_down("KeyW");
        assert!(input.is_command_active(Command::Forward));
        assert!(input.is_held("KeyW"));

        input.key_up("KeyW");
        assert!(!input.is_command_active(Command::Forward));
        assert!(!input.is_held("KeyW"));
    }

    #[test]
    fn test_shared_command_survives_partial_release() {
        let mut bindings = Bindings::default();
        bindings.bind("ArrowUp", Command::Forward).unwrap();
        let mut input = InputState::new(bindings);

        input.key_down("KeyW");
        input.key_down("ArrowUp");
        input.key_up("ArrowUp");
        assert!(input.is_held("KeyW"));
        assert!(input.is_command_active(Command::Forward));

        input.key_up("KeyW");
        assert!(!input.is_command_active(Command::Forward));
    }

    #[test]
    fn test_unbound_key_only_updates_last_pressed() {
        let mut input = InputState::default();
        input.key_down("KeyQ");
        assert_eq!(input.last_pressed(), Some("KeyQ"));
        assert!(Command::ALL.iter().all(|c| !input.is_command_active(*c)));
    }

    #[test]
    fn test_unset_survives_auto_repeat() {
        let mut input = InputState::default();
        input.key_down("KeyP");
        input.unset_command(Command::Pause);
        input.key_down("KeyP");
        input.key_down("KeyP");
        assert!(!input.is_command_active(Command::Pause));

        input.key_up("KeyP");
        input.key_down("KeyP");
        assert!(input.is_command_active(Command::Pause));
    }

    #[test]
    fn test_mouse_buttons() {
        let mut bindings = Bindings::default();
        bindings.bind("Mouse0", Command::Forward).unwrap();
        let mut input = InputState::new(bindings);

        input.mouse_button_down(0);
        assert!(input.is_command_active(Command::Forward));
        assert_eq!(input.last_pressed(), Some("Mouse0"));
        input.mouse_button_up(0);
        assert!(!input.is_command_active(Command::Forward));
    }

    #[test]
    fn test_focus_lost_releases_everything() {
        let mut input = InputState::default();
        input.key_down("KeyW");
        input.key_down("KeyA");
        input.focus_lost();
        assert!(!input.is_command_active(Command::Forward));
        assert!(!input.is_command_active(Command::Left));

        // Held set is cleared too, so the next press registers
        input.key_down("KeyW");
        assert!(input.is_command_active(Command::Forward));
    }

    #[test]
    fn test_mouse_motion_requires_pointer_lock() {
        let mut input = InputState::default();
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        input.subscribe_mouse_delta(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        input.mouse_motion(1.0, 1.0);
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        input.request_pointer_lock();
        input.mouse_motion(1.0, 1.0);
        input.mouse_motion(2.0, 0.0);
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        input.exit_pointer_lock();
        input.mouse_motion(1.0, 1.0);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_subscribers_receive_delta_in_order() {
        let mut input = InputState::default();
        input.request_pointer_lock();
        let log = Arc::new(Mutex::new(Vec::new()));

        let first = log.clone();
        input.subscribe_mouse_delta(move |d| first.lock().unwrap().push(("a", d)));
        let second = log.clone();
        input.subscribe_mouse_delta(move |d| second.lock().unwrap().push(("b", d)));

        input.mouse_motion(3.0, -4.0);
        let seen = log.lock().unwrap().clone();
        assert_eq!(
            seen,
            vec![
                ("a", MouseDelta::new(3.0, -4.0)),
                ("b", MouseDelta::new(3.0, -4.0)),
            ]
        );
    }

    #[test]
    fn test_unsubscribe_is_idempotent() {
        let mut input = InputState::default();
        let a = input.subscribe_mouse_delta(|_| {});
        let b = input.subscribe_mouse_delta(|_| {});
        assert_ne!(a, b);
        assert_eq!(input.mouse_subscriber_count(), 2);

        assert!(input.unsubscribe_mouse_delta(a));
        assert!(!input.unsubscribe_mouse_delta(a));
        assert_eq!(input.mouse_subscriber_count(), 1);
    }
}

//! Collision events reported by the last step

use crate::collider::ColliderHandle;
use rapier3d::prelude as rapier;

/// A collision start or stop between two colliders
#[derive(Debug, Clone, PartialEq)]
pub struct CollisionEvent {
    pub collider1: ColliderHandle,
    pub collider2: ColliderHandle,
    /// `true` when contact began, `false` when it ended
    pub started: bool,
    /// `user_data` of each collider, captured when the event was drained
    pub user_data1: u128,
    pub user_data2: u128,
}

impl CollisionEvent {
    pub fn is_started(&self) -> bool {
        self.started
    }

    /// Either side carries `user_data`
    pub fn involves(&self, user_data: u128) -> bool {
        self.user_data1 == user_data || self.user_data2 == user_data
    }

    /// The user data of the side that is not `user_data`
    pub fn other(&self, user_data: u128) -> Option<u128> {
        if self.user_data1 == user_data {
            Some(self.user_data2)
        } else if self.user_data2 == user_data {
            Some(self.user_data1)
        } else {
            None
        }
    }
}

/// Forwards pipeline events into a channel drained after the step
pub(crate) struct ChannelEventCollector {
    pub(crate) collision_events: crossbeam_channel::Sender<rapier::CollisionEvent>,
}

impl rapier::EventHandler for ChannelEventCollector {
    fn handle_collision_event(
        &self,
        _bodies: &rapier::RigidBodySet,
        _colliders: &rapier::ColliderSet,
        event: rapier::CollisionEvent,
        _contact_pair: Option<&rapier::ContactPair>,
    ) {
        let _ = self.collision_events.send(event);
    }

    fn handle_contact_force_event(
        &self,
        _dt: f32,
        _bodies: &rapier::RigidBodySet,
        _colliders: &rapier::ColliderSet,
        _contact_pair: &rapier::ContactPair,
        _total_force_magnitude: f32,
    ) {
    }
}
